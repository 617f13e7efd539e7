//! Append-only ledger of authentication attempts, and the sliding-window
//! lockout decision derived from it.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::login_history::{LoginAttemptRecord, NewLoginAttempt};
use crate::repositories::login_history as login_history_repo;

/// Oldest `attempted_at` still counted by the sliding window; the store
/// counts failures with `attempted_at >= window_start`.
fn window_start(now: DateTime<Utc>, window_minutes: i64) -> DateTime<Utc> {
    now - Duration::minutes(window_minutes)
}

fn reaches_threshold(failures: i64, max_failed_attempts: u32) -> bool {
    failures >= i64::from(max_failed_attempts)
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginHistoryServiceTrait: Send + Sync {
    async fn record(&self, attempt: NewLoginAttempt) -> Result<(), AppError>;

    /// Failed attempts for this identifier within the lockout window.
    async fn recent_failures(&self, attempted_id_no: String) -> Result<i64, AppError>;

    /// Whether the identifier has hit the failure threshold inside the
    /// window. Keyed on the attempted identifier, so probing a nonexistent
    /// account locks out too.
    async fn is_locked(&self, attempted_id_no: String) -> Result<bool, AppError>;

    async fn list_for_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<LoginAttemptRecord>, AppError>;

    async fn cleanup_older_than_retention(&self) -> Result<u64, AppError>;
}

pub struct LoginHistoryService {
    pool: DbPool,
    max_failed_attempts: u32,
    window_minutes: i64,
    retention_days: i64,
}

impl LoginHistoryService {
    pub fn new(
        pool: DbPool,
        max_failed_attempts: u32,
        window_minutes: i64,
        retention_days: i64,
    ) -> Self {
        Self {
            pool,
            max_failed_attempts,
            window_minutes,
            retention_days,
        }
    }
}

#[async_trait]
impl LoginHistoryServiceTrait for LoginHistoryService {
    async fn record(&self, attempt: NewLoginAttempt) -> Result<(), AppError> {
        login_history_repo::insert_attempt(&self.pool, &attempt).await?;
        if attempt.is_success {
            tracing::debug!(attempted_id_no = %attempt.attempted_id_no, "Recorded successful login");
        } else {
            tracing::warn!(
                attempted_id_no = %attempt.attempted_id_no,
                reason = ?attempt.failure_reason,
                "Recorded failed login attempt"
            );
        }
        Ok(())
    }

    async fn recent_failures(&self, attempted_id_no: String) -> Result<i64, AppError> {
        let start = window_start(Utc::now(), self.window_minutes);
        Ok(
            login_history_repo::count_recent_failures(&self.pool, &attempted_id_no, start)
                .await?,
        )
    }

    async fn is_locked(&self, attempted_id_no: String) -> Result<bool, AppError> {
        let failures = self.recent_failures(attempted_id_no).await?;
        Ok(reaches_threshold(failures, self.max_failed_attempts))
    }

    async fn list_for_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<LoginAttemptRecord>, AppError> {
        Ok(login_history_repo::list_for_user(&self.pool, user_id, limit).await?)
    }

    async fn cleanup_older_than_retention(&self) -> Result<u64, AppError> {
        let cutoff = Utc::now() - Duration::days(self.retention_days);
        Ok(login_history_repo::delete_older_than(&self.pool, cutoff).await?)
    }
}
