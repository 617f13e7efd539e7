//! Models for the append-only login attempt ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// One login attempt. Never mutated after insert; pruned by the retention
/// sweep. `user_id` is nullable because failed attempts may target an
/// id-number that resolves to no account.
pub struct LoginAttemptRecord {
    pub id: i64,
    pub user_id: Option<i64>,
    /// The identifier the caller tried to log in with. Lockout is keyed on
    /// this value, not the resolved user id.
    pub attempted_id_no: String,
    pub is_success: bool,
    pub failure_reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device_info: Option<String>,
    pub location: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
/// Fields for a new ledger entry, before the store assigns id and timestamp.
pub struct NewLoginAttempt {
    pub attempted_id_no: String,
    pub user_id: Option<i64>,
    pub is_success: bool,
    pub failure_reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device_info: Option<String>,
}
