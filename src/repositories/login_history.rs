use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::login_history::{LoginAttemptRecord, NewLoginAttempt};

const HISTORY_COLUMNS: &str = "id, user_id, attempted_id_no, is_success, failure_reason, \
     ip_address, user_agent, device_info, location, attempted_at";

pub async fn insert_attempt(pool: &PgPool, attempt: &NewLoginAttempt) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO login_history \
             (user_id, attempted_id_no, is_success, failure_reason, ip_address, user_agent, \
              device_info) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(attempt.user_id)
    .bind(&attempt.attempted_id_no)
    .bind(attempt.is_success)
    .bind(&attempt.failure_reason)
    .bind(&attempt.ip_address)
    .bind(&attempt.user_agent)
    .bind(&attempt.device_info)
    .execute(pool)
    .await?;
    Ok(())
}

/// Failed attempts for an attempted identifier inside the sliding lockout
/// window. Keyed on the identifier as typed, so lockout applies whether or
/// not such a user exists.
pub async fn count_recent_failures(
    pool: &PgPool,
    attempted_id_no: &str,
    window_start: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM login_history \
         WHERE attempted_id_no = $1 AND is_success = FALSE AND attempted_at >= $2",
    )
    .bind(attempted_id_no)
    .bind(window_start)
    .fetch_one(pool)
    .await
}

pub async fn list_for_user(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<LoginAttemptRecord>, sqlx::Error> {
    sqlx::query_as::<_, LoginAttemptRecord>(&format!(
        "SELECT {HISTORY_COLUMNS} FROM login_history \
         WHERE user_id = $1 \
         ORDER BY attempted_at DESC \
         LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn delete_older_than(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM login_history WHERE attempted_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
