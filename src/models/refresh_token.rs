//! Models for refresh-token lifecycle records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// One refresh-token lifecycle instance. A record is superseded on rotation,
/// never mutated into a new token; `replaced_by_token_id` links the chain.
pub struct RefreshTokenRecord {
    pub id: i64,
    pub user_id: i64,
    /// SHA-256 hash of the opaque token. The raw token is never stored.
    pub token_hash: String,
    /// Correlation id (jti) shared with the paired access token.
    pub token_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    /// Token id of the successor record, set when this token was rotated.
    pub replaced_by_token_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device_info: Option<String>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    /// A record is usable iff it has not been revoked and has not expired.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && now < self.expires_at
    }
}
