use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::login_history::LoginAttemptRecord;
use crate::models::user::User;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LoginHistoryResponse {
    pub id: i64,
    pub is_success: bool,
    pub failure_reason: Option<String>,
    pub ip_address: Option<String>,
    pub device_info: Option<String>,
    pub location: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl From<LoginAttemptRecord> for LoginHistoryResponse {
    fn from(record: LoginAttemptRecord) -> Self {
        Self {
            id: record.id,
            is_success: record.is_success,
            failure_reason: record.failure_reason,
            ip_address: record.ip_address,
            device_info: record.device_info,
            location: record.location,
            attempted_at: record.attempted_at,
        }
    }
}

pub async fn list_login_history(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<LoginHistoryResponse>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let records = state.auth.list_login_history(user.id, limit).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}
