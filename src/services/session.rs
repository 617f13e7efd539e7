//! Device-visible session records, one per active refresh token.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::session::SessionRecord;
use crate::repositories::session as session_repo;
use crate::repositories::session::NewSession;
use crate::utils::device::parse_device_name;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionServiceTrait: Send + Sync {
    async fn create(
        &self,
        user_id: i64,
        refresh_token_id: i64,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<SessionRecord, AppError>;

    async fn find_active_by_refresh_token_id(
        &self,
        refresh_token_id: i64,
    ) -> Result<Option<SessionRecord>, AppError>;

    /// Re-points a live session at the successor refresh record after a
    /// rotation, extending the session lifetime to match.
    async fn rebind(&self, session_id: String, new_refresh_token_id: i64)
        -> Result<bool, AppError>;

    /// Ends the session if it is active and owned by `user_id`.
    async fn end(&self, session_id: String, user_id: i64) -> Result<bool, AppError>;

    async fn end_all(&self, user_id: i64) -> Result<u64, AppError>;

    async fn list_active(&self, user_id: i64) -> Result<Vec<SessionRecord>, AppError>;

    async fn cleanup_expired(&self) -> Result<u64, AppError>;
}

pub struct SessionService {
    pool: DbPool,
    expiration_days: i64,
}

impl SessionService {
    pub fn new(pool: DbPool, expiration_days: i64) -> Self {
        Self {
            pool,
            expiration_days,
        }
    }
}

#[async_trait]
impl SessionServiceTrait for SessionService {
    async fn create(
        &self,
        user_id: i64,
        refresh_token_id: i64,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<SessionRecord, AppError> {
        let new_session = NewSession {
            user_id,
            // Public identifier, deliberately distinct from both the row id
            // and the access token's jti.
            session_id: Uuid::new_v4().to_string(),
            refresh_token_id,
            device_name: Some(parse_device_name(user_agent.as_deref())),
            ip_address,
            user_agent,
            expires_at: Utc::now() + Duration::days(self.expiration_days),
        };
        let session = session_repo::insert_session(&self.pool, &new_session).await?;
        tracing::info!(
            user_id,
            session_id = %session.session_id,
            "Opened session"
        );
        Ok(session)
    }

    async fn find_active_by_refresh_token_id(
        &self,
        refresh_token_id: i64,
    ) -> Result<Option<SessionRecord>, AppError> {
        Ok(session_repo::find_active_by_refresh_token_id(&self.pool, refresh_token_id).await?)
    }

    async fn rebind(
        &self,
        session_id: String,
        new_refresh_token_id: i64,
    ) -> Result<bool, AppError> {
        let new_expires_at = Utc::now() + Duration::days(self.expiration_days);
        let rebound =
            session_repo::rebind_session(&self.pool, &session_id, new_refresh_token_id, new_expires_at)
                .await?;
        if !rebound {
            tracing::warn!(%session_id, "Session to rebind is no longer active");
        }
        Ok(rebound)
    }

    async fn end(&self, session_id: String, user_id: i64) -> Result<bool, AppError> {
        let ended = session_repo::end_session(&self.pool, &session_id, user_id).await?;
        if ended {
            tracing::info!(user_id, %session_id, "Ended session");
        }
        Ok(ended)
    }

    async fn end_all(&self, user_id: i64) -> Result<u64, AppError> {
        let count = session_repo::end_all_for_user(&self.pool, user_id).await?;
        tracing::info!(user_id, count, "Ended all sessions for user");
        Ok(count)
    }

    async fn list_active(&self, user_id: i64) -> Result<Vec<SessionRecord>, AppError> {
        Ok(session_repo::list_active_for_user(&self.pool, user_id).await?)
    }

    async fn cleanup_expired(&self) -> Result<u64, AppError> {
        Ok(session_repo::close_expired(&self.pool).await?)
    }
}
