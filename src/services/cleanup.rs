//! Periodic maintenance sweep: hard-deletes expired refresh tokens,
//! soft-closes expired sessions and prunes login history past retention.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::services::login_history::LoginHistoryServiceTrait;
use crate::services::refresh_token::RefreshTokenServiceTrait;
use crate::services::session::SessionServiceTrait;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub expired_tokens_deleted: u64,
    pub expired_sessions_closed: u64,
    pub history_rows_pruned: u64,
}

pub struct CleanupService {
    refresh_tokens: Arc<dyn RefreshTokenServiceTrait>,
    sessions: Arc<dyn SessionServiceTrait>,
    login_history: Arc<dyn LoginHistoryServiceTrait>,
}

impl CleanupService {
    pub fn new(
        refresh_tokens: Arc<dyn RefreshTokenServiceTrait>,
        sessions: Arc<dyn SessionServiceTrait>,
        login_history: Arc<dyn LoginHistoryServiceTrait>,
    ) -> Self {
        Self {
            refresh_tokens,
            sessions,
            login_history,
        }
    }

    /// One full sweep. The three sub-steps are independent: a failure in one
    /// is logged and does not stop the others.
    pub async fn run_once(&self) -> CleanupReport {
        let mut report = CleanupReport::default();

        match self.refresh_tokens.cleanup_expired().await {
            Ok(count) => report.expired_tokens_deleted = count,
            Err(err) => tracing::error!(error = ?err, "Failed to delete expired refresh tokens"),
        }
        match self.sessions.cleanup_expired().await {
            Ok(count) => report.expired_sessions_closed = count,
            Err(err) => tracing::error!(error = ?err, "Failed to close expired sessions"),
        }
        match self.login_history.cleanup_older_than_retention().await {
            Ok(count) => report.history_rows_pruned = count,
            Err(err) => tracing::error!(error = ?err, "Failed to prune login history"),
        }

        tracing::info!(
            expired_tokens = report.expired_tokens_deleted,
            expired_sessions = report.expired_sessions_closed,
            history_pruned = report.history_rows_pruned,
            "Cleanup sweep finished"
        );
        report
    }

    /// Spawns the recurring sweep. The first run happens immediately; sweeps
    /// are idempotent so an extra run at startup is harmless.
    pub fn spawn(self: Arc<Self>, interval_secs: u64) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.run_once().await;
            }
        })
    }
}
