//! One-shot maintenance sweep, for running from cron or by hand instead of
//! (or in addition to) the in-process interval task.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use authcenter_backend::config::Config;
use authcenter_backend::db::connection::create_pool;
use authcenter_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authcenter_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;
    let state = AppState::new(pool, config);

    let report = state.cleanup_service().run_once().await;
    tracing::info!(
        expired_tokens = report.expired_tokens_deleted,
        expired_sessions = report.expired_sessions_closed,
        history_pruned = report.history_rows_pruned,
        "One-shot cleanup complete"
    );
    Ok(())
}
