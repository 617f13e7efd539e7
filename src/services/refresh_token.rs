//! Refresh-token lifecycle: opaque token minting, hashed-at-rest storage,
//! validation and one-shot rotation.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::refresh_token::RefreshTokenRecord;
use crate::repositories::refresh_token as refresh_token_repo;
use crate::repositories::refresh_token::NewRefreshToken;

const RAW_TOKEN_BYTES: usize = 64;

/// Lowercase hex SHA-256 of the raw token. Only this digest is ever stored
/// or used for lookup; the raw token exists only in transit.
pub fn hash_token(raw_token: &str) -> String {
    hex::encode(Sha256::digest(raw_token.as_bytes()))
}

fn generate_raw_token() -> String {
    let mut bytes = [0u8; RAW_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// A freshly minted refresh token: the raw secret handed to the client once,
/// plus the stored record it maps to.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub raw_token: String,
    pub record: RefreshTokenRecord,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RefreshTokenServiceTrait: Send + Sync {
    async fn create(
        &self,
        user_id: i64,
        token_id: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
        device_info: Option<String>,
    ) -> Result<IssuedRefreshToken, AppError>;

    /// Resolves a presented raw token to its active record. Unknown, expired
    /// and revoked tokens all come back as `None`; the caller cannot tell
    /// which, by design of the wire surface (the log can).
    async fn validate(&self, raw_token: String) -> Result<Option<RefreshTokenRecord>, AppError>;

    /// Atomically retires an active record in favour of a successor. `None`
    /// means the record was already revoked, i.e. this rotation lost a race
    /// or replayed a spent token.
    async fn rotate(
        &self,
        old_record_id: i64,
        user_id: i64,
        new_token_id: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
        device_info: Option<String>,
    ) -> Result<Option<IssuedRefreshToken>, AppError>;

    /// Revokes by raw token. Idempotent: unknown or already-revoked tokens
    /// are a no-op success.
    async fn revoke(&self, raw_token: String) -> Result<(), AppError>;

    async fn revoke_all(&self, user_id: i64) -> Result<u64, AppError>;

    async fn cleanup_expired(&self) -> Result<u64, AppError>;
}

pub struct RefreshTokenService {
    pool: DbPool,
    expiration_days: i64,
}

impl RefreshTokenService {
    pub fn new(pool: DbPool, expiration_days: i64) -> Self {
        Self {
            pool,
            expiration_days,
        }
    }

    async fn insert(
        &self,
        user_id: i64,
        token_id: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
        device_info: Option<String>,
    ) -> Result<IssuedRefreshToken, AppError> {
        let raw_token = generate_raw_token();
        let new_token = NewRefreshToken {
            user_id,
            token_hash: hash_token(&raw_token),
            token_id,
            expires_at: Utc::now() + Duration::days(self.expiration_days),
            ip_address,
            user_agent,
            device_info,
        };
        let record = refresh_token_repo::insert_refresh_token(&self.pool, &new_token).await?;
        Ok(IssuedRefreshToken { raw_token, record })
    }
}

#[async_trait]
impl RefreshTokenServiceTrait for RefreshTokenService {
    async fn create(
        &self,
        user_id: i64,
        token_id: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
        device_info: Option<String>,
    ) -> Result<IssuedRefreshToken, AppError> {
        let issued = self
            .insert(user_id, token_id, ip_address, user_agent, device_info)
            .await?;
        tracing::debug!(
            user_id,
            token_id = %issued.record.token_id,
            "Issued refresh token"
        );
        Ok(issued)
    }

    async fn validate(&self, raw_token: String) -> Result<Option<RefreshTokenRecord>, AppError> {
        let token_hash = hash_token(&raw_token);
        let Some(record) = refresh_token_repo::find_by_token_hash(&self.pool, &token_hash).await?
        else {
            tracing::debug!("Refresh token not found");
            return Ok(None);
        };

        if record.is_revoked {
            // A spent token coming back is the replay signature.
            tracing::warn!(
                user_id = record.user_id,
                token_id = %record.token_id,
                replaced_by = ?record.replaced_by_token_id,
                "Revoked refresh token presented"
            );
            return Ok(None);
        }
        if !record.is_active(Utc::now()) {
            tracing::debug!(
                user_id = record.user_id,
                token_id = %record.token_id,
                "Expired refresh token presented"
            );
            return Ok(None);
        }

        if let Err(err) = refresh_token_repo::touch_last_used(&self.pool, record.id).await {
            tracing::warn!(error = %err, "Failed to update refresh token last_used_at");
        }
        Ok(Some(record))
    }

    async fn rotate(
        &self,
        old_record_id: i64,
        user_id: i64,
        new_token_id: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
        device_info: Option<String>,
    ) -> Result<Option<IssuedRefreshToken>, AppError> {
        // Revoke-first: whichever concurrent request flips the row wins, the
        // other sees zero rows updated and must fail the rotation.
        let claimed =
            refresh_token_repo::revoke_if_active(&self.pool, old_record_id, Some(&new_token_id))
                .await?;
        if !claimed {
            return Ok(None);
        }

        let issued = self
            .insert(user_id, new_token_id, ip_address, user_agent, device_info)
            .await?;
        tracing::info!(
            user_id,
            token_id = %issued.record.token_id,
            "Rotated refresh token"
        );
        Ok(Some(issued))
    }

    async fn revoke(&self, raw_token: String) -> Result<(), AppError> {
        let token_hash = hash_token(&raw_token);
        let Some(record) = refresh_token_repo::find_by_token_hash(&self.pool, &token_hash).await?
        else {
            tracing::debug!("Revoke requested for unknown refresh token");
            return Ok(());
        };
        let revoked = refresh_token_repo::revoke_if_active(&self.pool, record.id, None).await?;
        if revoked {
            tracing::info!(
                user_id = record.user_id,
                token_id = %record.token_id,
                "Revoked refresh token"
            );
        }
        Ok(())
    }

    async fn revoke_all(&self, user_id: i64) -> Result<u64, AppError> {
        let count = refresh_token_repo::revoke_all_for_user(&self.pool, user_id).await?;
        tracing::info!(user_id, count, "Revoked all refresh tokens for user");
        Ok(count)
    }

    async fn cleanup_expired(&self) -> Result<u64, AppError> {
        Ok(refresh_token_repo::delete_expired(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_tokens_are_unique_and_url_safe() {
        let a = generate_raw_token();
        let b = generate_raw_token();
        assert_ne!(a, b);
        // 64 bytes of entropy, unpadded base64url.
        assert_eq!(a.len(), 86);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn hash_is_deterministic_hex_sha256() {
        let raw = "some-raw-token";
        let hash = hash_token(raw);
        assert_eq!(hash, hash_token(raw));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(hash, hash_token("some-other-token"));
    }

    #[test]
    fn hash_does_not_leak_raw_token() {
        let raw = generate_raw_token();
        assert!(!hash_token(&raw).contains(&raw[..10]));
    }
}
