use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::refresh_token::RefreshTokenRecord;

const TOKEN_COLUMNS: &str = "id, user_id, token_hash, token_id, created_at, expires_at, \
     is_revoked, revoked_at, replaced_by_token_id, ip_address, user_agent, device_info, \
     last_used_at";

pub struct NewRefreshToken {
    pub user_id: i64,
    pub token_hash: String,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device_info: Option<String>,
}

pub async fn insert_refresh_token(
    pool: &PgPool,
    new_token: &NewRefreshToken,
) -> Result<RefreshTokenRecord, sqlx::Error> {
    sqlx::query_as::<_, RefreshTokenRecord>(&format!(
        "INSERT INTO refresh_tokens \
             (user_id, token_hash, token_id, expires_at, ip_address, user_agent, device_info) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {TOKEN_COLUMNS}"
    ))
    .bind(new_token.user_id)
    .bind(&new_token.token_hash)
    .bind(&new_token.token_id)
    .bind(new_token.expires_at)
    .bind(&new_token.ip_address)
    .bind(&new_token.user_agent)
    .bind(&new_token.device_info)
    .fetch_one(pool)
    .await
}

pub async fn find_by_token_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<RefreshTokenRecord>, sqlx::Error> {
    sqlx::query_as::<_, RefreshTokenRecord>(&format!(
        "SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE token_hash = $1"
    ))
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

pub async fn touch_last_used(pool: &PgPool, record_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE refresh_tokens SET last_used_at = NOW() WHERE id = $1")
        .bind(record_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Conditionally revokes a still-active record, linking it to its successor.
/// Returns `false` when the record was already revoked, which is how a
/// concurrent rotation race or a replayed token shows up.
pub async fn revoke_if_active(
    pool: &PgPool,
    record_id: i64,
    replaced_by_token_id: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE refresh_tokens \
         SET is_revoked = TRUE, revoked_at = NOW(), replaced_by_token_id = $2 \
         WHERE id = $1 AND is_revoked = FALSE",
    )
    .bind(record_id)
    .bind(replaced_by_token_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn revoke_all_for_user(pool: &PgPool, user_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE refresh_tokens \
         SET is_revoked = TRUE, revoked_at = NOW() \
         WHERE user_id = $1 AND is_revoked = FALSE",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
