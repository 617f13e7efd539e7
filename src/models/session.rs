//! Models for per-device login sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// One logical device session. `session_id` is the public identity embedded
/// in access tokens and stays constant while `refresh_token_id` is repointed
/// on every rotation.
pub struct SessionRecord {
    pub id: i64,
    pub user_id: i64,
    /// Public session identity, independent of token rotation.
    pub session_id: String,
    /// Id of the refresh-token record the session is currently bound to.
    pub refresh_token_id: i64,
    pub device_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub login_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub logout_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}
