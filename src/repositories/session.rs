use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::session::SessionRecord;

const SESSION_COLUMNS: &str = "id, user_id, session_id, refresh_token_id, device_name, \
     ip_address, user_agent, login_at, last_activity_at, logout_at, expires_at, is_active";

pub struct NewSession {
    pub user_id: i64,
    pub session_id: String,
    pub refresh_token_id: i64,
    pub device_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
}

pub async fn insert_session(
    pool: &PgPool,
    new_session: &NewSession,
) -> Result<SessionRecord, sqlx::Error> {
    sqlx::query_as::<_, SessionRecord>(&format!(
        "INSERT INTO user_sessions \
             (user_id, session_id, refresh_token_id, device_name, ip_address, user_agent, \
              expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {SESSION_COLUMNS}"
    ))
    .bind(new_session.user_id)
    .bind(&new_session.session_id)
    .bind(new_session.refresh_token_id)
    .bind(&new_session.device_name)
    .bind(&new_session.ip_address)
    .bind(&new_session.user_agent)
    .bind(new_session.expires_at)
    .fetch_one(pool)
    .await
}

pub async fn find_active_by_refresh_token_id(
    pool: &PgPool,
    refresh_token_id: i64,
) -> Result<Option<SessionRecord>, sqlx::Error> {
    sqlx::query_as::<_, SessionRecord>(&format!(
        "SELECT {SESSION_COLUMNS} FROM user_sessions \
         WHERE refresh_token_id = $1 AND is_active = TRUE"
    ))
    .bind(refresh_token_id)
    .fetch_optional(pool)
    .await
}

/// Points a session at the successor refresh record after a rotation and
/// extends its lifetime to match. Touches `last_activity_at` as well.
pub async fn rebind_session(
    pool: &PgPool,
    session_id: &str,
    new_refresh_token_id: i64,
    new_expires_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE user_sessions \
         SET refresh_token_id = $2, expires_at = $3, last_activity_at = NOW() \
         WHERE session_id = $1 AND is_active = TRUE",
    )
    .bind(session_id)
    .bind(new_refresh_token_id)
    .bind(new_expires_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Ends a session only when it belongs to the given user, so one user can
/// never close another user's session by guessing session ids.
pub async fn end_session(
    pool: &PgPool,
    session_id: &str,
    user_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE user_sessions \
         SET is_active = FALSE, logout_at = NOW() \
         WHERE session_id = $1 AND user_id = $2 AND is_active = TRUE",
    )
    .bind(session_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn end_all_for_user(pool: &PgPool, user_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE user_sessions \
         SET is_active = FALSE, logout_at = NOW() \
         WHERE user_id = $1 AND is_active = TRUE",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_active_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<SessionRecord>, sqlx::Error> {
    sqlx::query_as::<_, SessionRecord>(&format!(
        "SELECT {SESSION_COLUMNS} FROM user_sessions \
         WHERE user_id = $1 AND is_active = TRUE AND expires_at > NOW() \
         ORDER BY last_activity_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Soft-closes sessions whose lifetime has run out. Rows are kept for audit
/// until the history sweep removes them.
pub async fn close_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE user_sessions \
         SET is_active = FALSE, logout_at = NOW() \
         WHERE is_active = TRUE AND expires_at < NOW()",
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
