use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::session::SessionRecord;
use crate::models::user::User;
use crate::state::AppState;
use crate::utils::jwt::Claims;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub device_name: Option<String>,
    pub ip_address: Option<String>,
    pub login_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// True for the session the calling token is bound to.
    pub is_current: bool,
}

impl SessionResponse {
    fn from_record(record: SessionRecord, current_session_id: &str) -> Self {
        Self {
            is_current: record.session_id == current_session_id,
            session_id: record.session_id,
            device_name: record.device_name,
            ip_address: record.ip_address,
            login_at: record.login_at,
            last_activity_at: record.last_activity_at,
            expires_at: record.expires_at,
        }
    }
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<SessionResponse>>, AppError> {
    let sessions = state.auth.list_active_sessions(user.id).await?;
    let response = sessions
        .into_iter()
        .map(|record| SessionResponse::from_record(record, &claims.session_id))
        .collect();
    Ok(Json(response))
}

/// Ends one of the caller's own sessions. A session id that does not exist,
/// is already ended, or belongs to someone else is uniformly a 404.
pub async fn end_session(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.auth.end_session(user.id, session_id).await?;
    Ok(Json(json!({ "message": "Session ended" })))
}
