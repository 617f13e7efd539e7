use std::sync::Arc;

use crate::config::Config;
use crate::db::connection::DbPool;
use crate::repositories::user::PgUserRepository;
use crate::services::auth::AuthService;
use crate::services::cleanup::CleanupService;
use crate::services::login_history::{LoginHistoryService, LoginHistoryServiceTrait};
use crate::services::refresh_token::{RefreshTokenService, RefreshTokenServiceTrait};
use crate::services::session::{SessionService, SessionServiceTrait};
use crate::utils::jwt::AccessTokenCodec;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
    pub codec: AccessTokenCodec,
    pub refresh_tokens: Arc<dyn RefreshTokenServiceTrait>,
    pub sessions: Arc<dyn SessionServiceTrait>,
    pub login_history: Arc<dyn LoginHistoryServiceTrait>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> Self {
        let codec = AccessTokenCodec::from_config(&config);

        let users = Arc::new(PgUserRepository::new(pool.clone()));
        let refresh_tokens: Arc<dyn RefreshTokenServiceTrait> = Arc::new(
            RefreshTokenService::new(pool.clone(), config.refresh_token_expiration_days),
        );
        let sessions: Arc<dyn SessionServiceTrait> = Arc::new(SessionService::new(
            pool.clone(),
            config.refresh_token_expiration_days,
        ));
        let login_history: Arc<dyn LoginHistoryServiceTrait> = Arc::new(LoginHistoryService::new(
            pool.clone(),
            config.lockout_max_failed_attempts,
            config.lockout_window_minutes,
            config.login_history_retention_days,
        ));

        let auth = Arc::new(AuthService::new(
            users,
            refresh_tokens.clone(),
            sessions.clone(),
            login_history.clone(),
            codec.clone(),
            config.lockout_max_failed_attempts,
            config.lockout_window_minutes,
        ));

        Self {
            pool,
            config,
            codec,
            refresh_tokens,
            sessions,
            login_history,
            auth,
        }
    }

    pub fn cleanup_service(&self) -> CleanupService {
        CleanupService::new(
            self.refresh_tokens.clone(),
            self.sessions.clone(),
            self.login_history.clone(),
        )
    }
}
