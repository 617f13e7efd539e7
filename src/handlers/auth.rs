use axum::{
    extract::State,
    http::{header, HeaderMap},
    Extension, Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::error::AppError;
use crate::models::user::{
    LoginRequest, ProfileResponse, RefreshTokenRequest, RevokeTokenRequest, TokenBundle,
    User, ValidateTokenRequest, ValidateTokenResult,
};
use crate::state::AppState;
use crate::utils::jwt::Claims;

/// Client address as reported by the reverse proxy. First hop of
/// X-Forwarded-For, falling back to X-Real-IP.
pub(crate) fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

pub(crate) fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenBundle>, AppError> {
    payload.validate()?;
    let bundle = state
        .auth
        .login(
            &payload.id_no,
            &payload.password,
            payload.target_system.as_deref(),
            client_ip(&headers),
            user_agent(&headers),
        )
        .await?;
    Ok(Json(bundle))
}

pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<Json<TokenBundle>, AppError> {
    payload.validate()?;
    let bundle = state
        .auth
        .refresh(
            &payload.refresh_token,
            payload.target_system.as_deref(),
            client_ip(&headers),
            user_agent(&headers),
        )
        .await?;
    Ok(Json(bundle))
}

/// Downstream systems call this to verify tokens they received. Always 200;
/// the verdict is in the body.
pub async fn validate(
    State(state): State<AppState>,
    Json(payload): Json<ValidateTokenRequest>,
) -> Result<Json<ValidateTokenResult>, AppError> {
    payload.validate()?;
    Ok(Json(state.auth.validate_token(&payload.token)))
}

pub async fn revoke(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RevokeTokenRequest>,
) -> Result<Json<Value>, AppError> {
    // Default to the caller's own session when no explicit target is given.
    let session_id = payload
        .session_id
        .or_else(|| (!claims.session_id.is_empty()).then(|| claims.session_id.clone()));
    state
        .auth
        .revoke(
            user.id,
            payload.refresh_token,
            session_id,
            payload.revoke_all_devices,
        )
        .await?;
    Ok(Json(json!({ "message": "Tokens revoked" })))
}

pub async fn me(Extension(user): Extension<User>) -> Json<ProfileResponse> {
    Json(ProfileResponse::from(user))
}
