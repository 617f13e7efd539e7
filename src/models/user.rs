//! Models for user accounts and the authentication request/response payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// Database representation of a user account.
pub struct User {
    /// Unique identifier for the user.
    pub id: i64,
    /// Unique external id-number used for login.
    pub id_no: String,
    /// Display name embedded in issued tokens.
    pub name: String,
    /// Argon2 hash of the user's password.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
/// Credentials submitted by a user attempting to authenticate.
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub id_no: String,
    #[validate(length(min = 1, max = 255))]
    pub password: String,
    /// Optional downstream system the access token should be scoped to.
    #[serde(default)]
    pub target_system: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
/// Payload exchanging a refresh token for a new token pair.
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
    #[serde(default)]
    pub target_system: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
/// Payload asking the auth center to verify an access token.
pub struct ValidateTokenRequest {
    #[validate(length(min = 1))]
    pub token: String,
}

#[derive(Debug, Deserialize, Default)]
/// Logout payload. Either a target (refresh token and/or session id) or
/// `revoke_all_devices` must be supplied.
pub struct RevokeTokenRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub revoke_all_devices: bool,
}

#[derive(Debug, Clone, Serialize)]
/// Tokens returned after a successful login or refresh.
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
    /// Absent when a refresh was completed for a token no longer bound to a
    /// live session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
/// Outcome of a stateless access-token verification.
pub struct ValidateTokenResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ValidateTokenResult {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            user_id: None,
            id_no: None,
            name: None,
            session_id: None,
            token_id: None,
            expires_at: None,
            error_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
/// Public-facing representation of a user returned by the API.
pub struct ProfileResponse {
    pub id: i64,
    pub id_no: String,
    pub name: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        ProfileResponse {
            id: user.id,
            id_no: user.id_no,
            name: user.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn login_request_rejects_empty_fields() {
        let request = LoginRequest {
            id_no: String::new(),
            password: "secret".into(),
            target_system: None,
        };
        assert!(request.validate().is_err());

        let request = LoginRequest {
            id_no: "A123456789".into(),
            password: "secret".into(),
            target_system: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn token_bundle_omits_absent_session_id() {
        let bundle = TokenBundle {
            access_token: "a".into(),
            refresh_token: "r".into(),
            token_type: "Bearer".into(),
            expires_at: Utc::now(),
            refresh_token_expires_at: Utc::now(),
            session_id: None,
        };
        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json.get("session_id").is_none());
    }

    #[test]
    fn invalid_result_carries_no_claims() {
        let result = ValidateTokenResult::invalid("token expired");
        assert!(!result.is_valid);
        assert!(result.user_id.is_none());
        assert!(result.session_id.is_none());
        assert_eq!(result.error_message.as_deref(), Some("token expired"));
    }
}
