use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use authcenter_backend::config::Config;
use authcenter_backend::db::connection::create_pool;
use authcenter_backend::routes::build_router;
use authcenter_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authcenter_backend=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        port = config.port,
        issuer = %config.jwt_issuer,
        audiences = ?config.jwt_audiences,
        "Configuration loaded"
    );

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let state = AppState::new(pool, config.clone());

    let cleanup = Arc::new(state.cleanup_service());
    cleanup.spawn(config.cleanup_interval_secs);
    tracing::info!(
        interval_secs = config.cleanup_interval_secs,
        "Cleanup sweeper started"
    );

    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
