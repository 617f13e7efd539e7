//! Best-effort User-Agent classification for audit metadata. Used only for
//! display and device records, never for authorization decisions.

/// Coarse device class recorded with refresh tokens and login attempts.
pub fn extract_device_info(user_agent: Option<&str>) -> String {
    let Some(ua) = user_agent else {
        return "Unknown Device".to_string();
    };
    let ua = ua.to_lowercase();

    if ua.contains("tablet") || ua.contains("ipad") {
        "Tablet".to_string()
    } else if ua.contains("mobile") || ua.contains("android") || ua.contains("iphone") {
        "Mobile Device".to_string()
    } else {
        "Desktop".to_string()
    }
}

/// Human-readable "browser on OS" label shown in the session list.
pub fn parse_device_name(user_agent: Option<&str>) -> String {
    let Some(ua) = user_agent else {
        return "Unknown Device".to_string();
    };
    let ua = ua.to_lowercase();

    let browser = if ua.contains("edg/") {
        "Edge"
    } else if ua.contains("chrome/") {
        "Chrome"
    } else if ua.contains("firefox/") {
        "Firefox"
    } else if ua.contains("safari/") && !ua.contains("chrome") {
        "Safari"
    } else if ua.contains("opera") || ua.contains("opr/") {
        "Opera"
    } else {
        "Unknown Browser"
    };

    // iOS user-agents contain "like Mac OS X" and Android ones contain
    // "Linux", so the mobile checks must come first.
    let os = if ua.contains("iphone") || ua.contains("ipad") {
        "iOS"
    } else if ua.contains("android") {
        "Android"
    } else if ua.contains("windows") {
        "Windows"
    } else if ua.contains("macintosh") || ua.contains("mac os") {
        "macOS"
    } else if ua.contains("linux") {
        "Linux"
    } else {
        "Unknown OS"
    };

    format!("{} on {}", browser, os)
}
