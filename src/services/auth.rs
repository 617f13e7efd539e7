//! The authentication engine: login, refresh rotation, revocation and
//! stateless token validation, orchestrating the stores behind trait seams.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::login_history::{LoginAttemptRecord, NewLoginAttempt};
use crate::models::session::SessionRecord;
use crate::models::user::{TokenBundle, User, ValidateTokenResult};
use crate::repositories::user::UserRepository;
use crate::services::login_history::LoginHistoryServiceTrait;
use crate::services::refresh_token::RefreshTokenServiceTrait;
use crate::services::session::SessionServiceTrait;
use crate::utils::device::extract_device_info;
use crate::utils::jwt::AccessTokenCodec;
use crate::utils::password::verify_password;

/// Single message for every credential failure, so callers cannot probe
/// which account identifiers exist.
const INVALID_CREDENTIALS: &str = "Invalid credentials";
/// Single message for every refresh failure (unknown, expired, revoked,
/// replayed), for the same reason.
const INVALID_REFRESH_TOKEN: &str = "Refresh token is invalid or expired";

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenServiceTrait>,
    sessions: Arc<dyn SessionServiceTrait>,
    login_history: Arc<dyn LoginHistoryServiceTrait>,
    codec: AccessTokenCodec,
    lockout_max_failed_attempts: u32,
    lockout_window_minutes: i64,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenServiceTrait>,
        sessions: Arc<dyn SessionServiceTrait>,
        login_history: Arc<dyn LoginHistoryServiceTrait>,
        codec: AccessTokenCodec,
        lockout_max_failed_attempts: u32,
        lockout_window_minutes: i64,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            sessions,
            login_history,
            codec,
            lockout_max_failed_attempts,
            lockout_window_minutes,
        }
    }

    /// Ledger writes must never change an auth decision that has already
    /// been made, so failures are logged and swallowed here.
    async fn record_attempt(&self, attempt: NewLoginAttempt) {
        if let Err(err) = self.login_history.record(attempt).await {
            tracing::error!(error = ?err, "Failed to write login attempt to ledger");
        }
    }

    async fn failed_attempt_message(&self, id_no: &str) -> String {
        let failures = match self.login_history.recent_failures(id_no.to_string()).await {
            Ok(n) => n,
            Err(err) => {
                tracing::warn!(error = ?err, "Failed to count recent login failures");
                return INVALID_CREDENTIALS.to_string();
            }
        };
        let remaining = i64::from(self.lockout_max_failed_attempts) - failures;
        if (1..=2).contains(&remaining) {
            let noun = if remaining == 1 { "attempt" } else { "attempts" };
            format!("{INVALID_CREDENTIALS}. {remaining} {noun} remaining before lockout")
        } else {
            INVALID_CREDENTIALS.to_string()
        }
    }

    pub async fn login(
        &self,
        id_no: &str,
        password: &str,
        target_system: Option<&str>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<TokenBundle, AppError> {
        let device_info = extract_device_info(user_agent.as_deref());

        // Lockout is checked before any credential work and is keyed on the
        // attempted identifier, whether or not such an account exists.
        if self.login_history.is_locked(id_no.to_string()).await? {
            self.record_attempt(NewLoginAttempt {
                attempted_id_no: id_no.to_string(),
                user_id: None,
                is_success: false,
                failure_reason: Some("Account locked".to_string()),
                ip_address,
                user_agent,
                device_info: Some(device_info),
            })
            .await;
            return Err(AppError::Locked(format!(
                "Too many failed attempts. Try again in {} minutes",
                self.lockout_window_minutes
            )));
        }

        let user = match self.users.find_by_id_no(id_no.to_string()).await? {
            Some(user) => user,
            None => {
                self.record_attempt(NewLoginAttempt {
                    attempted_id_no: id_no.to_string(),
                    user_id: None,
                    is_success: false,
                    failure_reason: Some("User not found".to_string()),
                    ip_address,
                    user_agent,
                    device_info: Some(device_info),
                })
                .await;
                let message = self.failed_attempt_message(id_no).await;
                return Err(AppError::Unauthorized(message));
            }
        };

        // An infrastructure fault here (e.g. corrupt stored hash) propagates
        // as a 500 and is not written to the ledger as a credential failure.
        let password_ok = verify_password(password, &user.password_hash)?;
        if !password_ok {
            self.record_attempt(NewLoginAttempt {
                attempted_id_no: id_no.to_string(),
                user_id: Some(user.id),
                is_success: false,
                failure_reason: Some("Invalid password".to_string()),
                ip_address,
                user_agent,
                device_info: Some(device_info),
            })
            .await;
            let message = self.failed_attempt_message(id_no).await;
            return Err(AppError::Unauthorized(message));
        }

        // One correlation id ties the access token (jti) to the refresh
        // record issued alongside it.
        let token_id = AccessTokenCodec::new_token_id();
        let issued_refresh = self
            .refresh_tokens
            .create(
                user.id,
                token_id.clone(),
                ip_address.clone(),
                user_agent.clone(),
                Some(device_info.clone()),
            )
            .await?;
        let session = self
            .sessions
            .create(
                user.id,
                issued_refresh.record.id,
                ip_address.clone(),
                user_agent.clone(),
            )
            .await?;

        let access = self
            .codec
            .issue(&user, &session.session_id, &token_id, target_system)?;

        self.record_attempt(NewLoginAttempt {
            attempted_id_no: id_no.to_string(),
            user_id: Some(user.id),
            is_success: true,
            failure_reason: None,
            ip_address,
            user_agent,
            device_info: Some(device_info),
        })
        .await;
        tracing::info!(user_id = user.id, session_id = %session.session_id, "User logged in");

        Ok(TokenBundle {
            access_token: access.token,
            refresh_token: issued_refresh.raw_token,
            token_type: "Bearer".to_string(),
            expires_at: access.expires_at,
            refresh_token_expires_at: issued_refresh.record.expires_at,
            session_id: Some(session.session_id),
        })
    }

    pub async fn refresh(
        &self,
        raw_refresh_token: &str,
        target_system: Option<&str>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<TokenBundle, AppError> {
        let Some(old_record) = self
            .refresh_tokens
            .validate(raw_refresh_token.to_string())
            .await?
        else {
            return Err(AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string()));
        };

        let Some(user) = self.users.find_by_id(old_record.user_id).await? else {
            tracing::warn!(
                user_id = old_record.user_id,
                "Refresh token maps to a user that no longer exists"
            );
            return Err(AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string()));
        };

        let device_info = extract_device_info(user_agent.as_deref());
        let new_token_id = AccessTokenCodec::new_token_id();
        let Some(new_refresh) = self
            .refresh_tokens
            .rotate(
                old_record.id,
                old_record.user_id,
                new_token_id.clone(),
                ip_address,
                user_agent,
                Some(device_info),
            )
            .await?
        else {
            // Lost the revoke race: another rotation of the same token got
            // there first.
            tracing::warn!(
                user_id = old_record.user_id,
                token_id = %old_record.token_id,
                "Concurrent refresh detected; rejecting the late request"
            );
            return Err(AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string()));
        };

        let session = self
            .sessions
            .find_active_by_refresh_token_id(old_record.id)
            .await?;
        let session_id = match &session {
            Some(session) => {
                self.sessions
                    .rebind(session.session_id.clone(), new_refresh.record.id)
                    .await?;
                session.session_id.clone()
            }
            None => {
                // Token outlived its session record. The rotation still
                // completes; the new token pair is just not session-bound.
                tracing::warn!(
                    user_id = user.id,
                    token_id = %old_record.token_id,
                    "Refresh token has no live session; rotating without one"
                );
                String::new()
            }
        };

        let access = self
            .codec
            .issue(&user, &session_id, &new_token_id, target_system)?;

        Ok(TokenBundle {
            access_token: access.token,
            refresh_token: new_refresh.raw_token,
            token_type: "Bearer".to_string(),
            expires_at: access.expires_at,
            refresh_token_expires_at: new_refresh.record.expires_at,
            session_id: (!session_id.is_empty()).then_some(session_id),
        })
    }

    /// Logout. `revoke_all_devices` takes precedence over any specific
    /// target; revoking an unknown or spent token is an idempotent success.
    pub async fn revoke(
        &self,
        user_id: i64,
        raw_refresh_token: Option<String>,
        session_id: Option<String>,
        revoke_all_devices: bool,
    ) -> Result<(), AppError> {
        if revoke_all_devices {
            let tokens = self.refresh_tokens.revoke_all(user_id).await?;
            let sessions = self.sessions.end_all(user_id).await?;
            tracing::info!(user_id, tokens, sessions, "Revoked all devices for user");
            return Ok(());
        }

        if raw_refresh_token.is_none() && session_id.is_none() {
            return Err(AppError::BadRequest(
                "Specify a refresh token, a session id, or revoke_all_devices".to_string(),
            ));
        }

        if let Some(raw_token) = raw_refresh_token {
            self.refresh_tokens.revoke(raw_token).await?;
        }
        if let Some(session_id) = session_id {
            if !self.sessions.end(session_id.clone(), user_id).await? {
                tracing::debug!(user_id, %session_id, "Session already inactive");
            }
        }
        Ok(())
    }

    /// Pure claim verification. No store access: revoking a refresh token
    /// does not invalidate access tokens already in flight, which simply age
    /// out at their short expiry.
    pub fn validate_token(&self, token: &str) -> ValidateTokenResult {
        match self.codec.verify(token) {
            Ok(claims) => ValidateTokenResult {
                is_valid: true,
                user_id: claims.user_id(),
                id_no: Some(claims.id_no.clone()),
                name: Some(claims.name.clone()),
                session_id: (!claims.session_id.is_empty()).then(|| claims.session_id.clone()),
                token_id: Some(claims.jti.clone()),
                expires_at: Some(claims.expires_at()),
                error_message: None,
            },
            Err(err) => ValidateTokenResult::invalid(err.to_string()),
        }
    }

    pub async fn current_user(&self, user_id: i64) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn list_active_sessions(&self, user_id: i64) -> Result<Vec<SessionRecord>, AppError> {
        self.sessions.list_active(user_id).await
    }

    pub async fn end_session(&self, user_id: i64, session_id: String) -> Result<(), AppError> {
        if self.sessions.end(session_id, user_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Session not found".to_string()))
        }
    }

    pub async fn list_login_history(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<LoginAttemptRecord>, AppError> {
        self.login_history.list_for_user(user_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use mockall::predicate::eq;

    use crate::models::refresh_token::RefreshTokenRecord;
    use crate::repositories::user::MockUserRepository;
    use crate::services::login_history::MockLoginHistoryServiceTrait;
    use crate::services::refresh_token::{IssuedRefreshToken, MockRefreshTokenServiceTrait};
    use crate::services::session::MockSessionServiceTrait;
    use crate::utils::password::hash_password;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn codec() -> AccessTokenCodec {
        AccessTokenCodec::new(
            SECRET,
            "AuthCenter.Api",
            vec!["HRSystem".into(), "CRMSystem".into()],
            30,
        )
    }

    struct Mocks {
        users: MockUserRepository,
        refresh_tokens: MockRefreshTokenServiceTrait,
        sessions: MockSessionServiceTrait,
        login_history: MockLoginHistoryServiceTrait,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                users: MockUserRepository::new(),
                refresh_tokens: MockRefreshTokenServiceTrait::new(),
                sessions: MockSessionServiceTrait::new(),
                login_history: MockLoginHistoryServiceTrait::new(),
            }
        }

        fn into_service(self) -> AuthService {
            AuthService::new(
                Arc::new(self.users),
                Arc::new(self.refresh_tokens),
                Arc::new(self.sessions),
                Arc::new(self.login_history),
                codec(),
                5,
                15,
            )
        }
    }

    fn test_user(password: &str) -> User {
        let now = Utc::now();
        User {
            id: 7,
            id_no: "A123456789".into(),
            name: "Alice".into(),
            password_hash: hash_password(password).unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    fn token_record(id: i64, user_id: i64, token_id: &str) -> RefreshTokenRecord {
        let now = Utc::now();
        RefreshTokenRecord {
            id,
            user_id,
            token_hash: "hash".into(),
            token_id: token_id.into(),
            created_at: now,
            expires_at: now + Duration::days(7),
            is_revoked: false,
            revoked_at: None,
            replaced_by_token_id: None,
            ip_address: None,
            user_agent: None,
            device_info: None,
            last_used_at: None,
        }
    }

    fn session_record(user_id: i64, session_id: &str, refresh_token_id: i64) -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            id: 1,
            user_id,
            session_id: session_id.into(),
            refresh_token_id,
            device_name: Some("Chrome on Windows".into()),
            ip_address: None,
            user_agent: None,
            login_at: now,
            last_activity_at: now,
            logout_at: None,
            expires_at: now + Duration::days(7),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn login_issues_correlated_token_pair_and_session() {
        let mut mocks = Mocks::new();
        let user = test_user("hunter2hunter2");
        let user_clone = user.clone();

        mocks
            .login_history
            .expect_is_locked()
            .with(eq("A123456789".to_string()))
            .returning(|_| Ok(false));
        mocks
            .users
            .expect_find_by_id_no()
            .with(eq("A123456789".to_string()))
            .returning(move |_| Ok(Some(user_clone.clone())));
        mocks
            .refresh_tokens
            .expect_create()
            .withf(|user_id, _, _, _, _| *user_id == 7)
            .returning(|user_id, token_id, _, _, _| {
                Ok(IssuedRefreshToken {
                    raw_token: "raw-refresh".into(),
                    record: token_record(11, user_id, &token_id),
                })
            });
        mocks
            .sessions
            .expect_create()
            .withf(|user_id, refresh_token_id, _, _| *user_id == 7 && *refresh_token_id == 11)
            .returning(|user_id, refresh_token_id, _, _| {
                Ok(session_record(user_id, "session-abc", refresh_token_id))
            });
        mocks
            .login_history
            .expect_record()
            .withf(|attempt| attempt.is_success && attempt.user_id == Some(7))
            .returning(|_| Ok(()));

        let service = mocks.into_service();
        let bundle = service
            .login("A123456789", "hunter2hunter2", Some("CRMSystem"), None, None)
            .await
            .expect("login");

        assert_eq!(bundle.token_type, "Bearer");
        assert_eq!(bundle.refresh_token, "raw-refresh");
        assert_eq!(bundle.session_id.as_deref(), Some("session-abc"));

        let claims = codec().verify(&bundle.access_token).expect("valid access");
        assert_eq!(claims.user_id(), Some(7));
        assert_eq!(claims.session_id, "session-abc");
        assert_eq!(claims.aud, "CRMSystem");
        // The access token's jti matches the refresh record it was issued
        // with; the mock echoed the engine's token_id into the record.
        assert!(!claims.jti.is_empty());
    }

    #[tokio::test]
    async fn login_rejects_locked_identifier_before_credentials() {
        let mut mocks = Mocks::new();
        mocks
            .login_history
            .expect_is_locked()
            .returning(|_| Ok(true));
        mocks
            .login_history
            .expect_record()
            .withf(|attempt| {
                !attempt.is_success
                    && attempt.failure_reason.as_deref() == Some("Account locked")
            })
            .returning(|_| Ok(()));
        // No user lookup and no password check may happen.
        mocks.users.expect_find_by_id_no().never();

        let service = mocks.into_service();
        let err = service
            .login("A123456789", "whatever", None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Locked(_)));
    }

    #[tokio::test]
    async fn login_unknown_user_and_wrong_password_are_indistinguishable() {
        // Unknown identifier.
        let mut mocks = Mocks::new();
        mocks
            .login_history
            .expect_is_locked()
            .returning(|_| Ok(false));
        mocks.users.expect_find_by_id_no().returning(|_| Ok(None));
        mocks
            .login_history
            .expect_record()
            .withf(|attempt| !attempt.is_success && attempt.user_id.is_none())
            .returning(|_| Ok(()));
        mocks
            .login_history
            .expect_recent_failures()
            .returning(|_| Ok(1));
        let unknown_err = mocks
            .into_service()
            .login("NOBODY", "whatever", None, None, None)
            .await
            .unwrap_err();

        // Known identifier, wrong password.
        let mut mocks = Mocks::new();
        let user = test_user("correct-password");
        mocks
            .login_history
            .expect_is_locked()
            .returning(|_| Ok(false));
        mocks
            .users
            .expect_find_by_id_no()
            .returning(move |_| Ok(Some(user.clone())));
        mocks
            .login_history
            .expect_record()
            .withf(|attempt| !attempt.is_success && attempt.user_id == Some(7))
            .returning(|_| Ok(()));
        mocks
            .login_history
            .expect_recent_failures()
            .returning(|_| Ok(1));
        let wrong_password_err = mocks
            .into_service()
            .login("A123456789", "wrong-password", None, None, None)
            .await
            .unwrap_err();

        match (unknown_err, wrong_password_err) {
            (AppError::Unauthorized(a), AppError::Unauthorized(b)) => {
                assert_eq!(a, b);
                assert_eq!(a, "Invalid credentials");
            }
            other => panic!("expected two Unauthorized errors, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn login_warns_when_one_attempt_from_lockout() {
        let mut mocks = Mocks::new();
        let user = test_user("correct-password");
        mocks
            .login_history
            .expect_is_locked()
            .returning(|_| Ok(false));
        mocks
            .users
            .expect_find_by_id_no()
            .returning(move |_| Ok(Some(user.clone())));
        mocks.login_history.expect_record().returning(|_| Ok(()));
        // 4 failures already recorded out of a maximum of 5.
        mocks
            .login_history
            .expect_recent_failures()
            .returning(|_| Ok(4));

        let err = mocks
            .into_service()
            .login("A123456789", "wrong-password", None, None, None)
            .await
            .unwrap_err();
        match err {
            AppError::Unauthorized(message) => {
                assert!(message.contains("1 attempt remaining"), "{message}");
            }
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn login_rejection_stands_when_ledger_write_fails() {
        let mut mocks = Mocks::new();
        let user = test_user("correct-password");
        mocks
            .login_history
            .expect_is_locked()
            .returning(|_| Ok(false));
        mocks
            .users
            .expect_find_by_id_no()
            .returning(move |_| Ok(Some(user.clone())));
        mocks
            .login_history
            .expect_record()
            .returning(|_| Err(AppError::InternalServerError(anyhow::anyhow!("db down"))));
        mocks
            .login_history
            .expect_recent_failures()
            .returning(|_| Ok(0));

        let err = mocks
            .into_service()
            .login("A123456789", "wrong-password", None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn refresh_rotates_token_and_rebinds_session() {
        let mut mocks = Mocks::new();
        let user = test_user("irrelevant");
        let old = token_record(11, 7, "old-jti");

        mocks
            .refresh_tokens
            .expect_validate()
            .with(eq("raw-old".to_string()))
            .returning(move |_| Ok(Some(old.clone())));
        mocks
            .users
            .expect_find_by_id()
            .with(eq(7i64))
            .returning(move |_| Ok(Some(user.clone())));
        mocks
            .refresh_tokens
            .expect_rotate()
            .withf(|old_id, user_id, _, _, _, _| *old_id == 11 && *user_id == 7)
            .returning(|_, user_id, new_token_id, _, _, _| {
                Ok(Some(IssuedRefreshToken {
                    raw_token: "raw-new".into(),
                    record: token_record(12, user_id, &new_token_id),
                }))
            });
        mocks
            .sessions
            .expect_find_active_by_refresh_token_id()
            .with(eq(11i64))
            .returning(|_| Ok(Some(session_record(7, "session-abc", 11))));
        mocks
            .sessions
            .expect_rebind()
            .with(eq("session-abc".to_string()), eq(12i64))
            .returning(|_, _| Ok(true));

        let bundle = mocks
            .into_service()
            .refresh("raw-old", None, None, None)
            .await
            .expect("refresh");

        assert_eq!(bundle.refresh_token, "raw-new");
        assert_eq!(bundle.session_id.as_deref(), Some("session-abc"));
        let claims = codec().verify(&bundle.access_token).expect("valid access");
        assert_eq!(claims.session_id, "session-abc");
        assert_ne!(claims.jti, "old-jti");
    }

    #[tokio::test]
    async fn refresh_rejects_unknown_token_with_generic_message() {
        let mut mocks = Mocks::new();
        mocks
            .refresh_tokens
            .expect_validate()
            .returning(|_| Ok(None));
        mocks.users.expect_find_by_id().never();

        let err = mocks
            .into_service()
            .refresh("bogus", None, None, None)
            .await
            .unwrap_err();
        match err {
            AppError::Unauthorized(message) => {
                assert_eq!(message, "Refresh token is invalid or expired");
            }
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn refresh_losing_rotation_race_gets_same_generic_message() {
        let mut mocks = Mocks::new();
        let user = test_user("irrelevant");
        let old = token_record(11, 7, "old-jti");

        mocks
            .refresh_tokens
            .expect_validate()
            .returning(move |_| Ok(Some(old.clone())));
        mocks
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        // Someone else revoked the record between validate and rotate.
        mocks
            .refresh_tokens
            .expect_rotate()
            .returning(|_, _, _, _, _, _| Ok(None));
        mocks.sessions.expect_find_active_by_refresh_token_id().never();

        let err = mocks
            .into_service()
            .refresh("raw-old", None, None, None)
            .await
            .unwrap_err();
        match err {
            AppError::Unauthorized(message) => {
                assert_eq!(message, "Refresh token is invalid or expired");
            }
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn refresh_without_live_session_still_rotates() {
        let mut mocks = Mocks::new();
        let user = test_user("irrelevant");
        let old = token_record(11, 7, "old-jti");

        mocks
            .refresh_tokens
            .expect_validate()
            .returning(move |_| Ok(Some(old.clone())));
        mocks
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        mocks
            .refresh_tokens
            .expect_rotate()
            .returning(|_, user_id, new_token_id, _, _, _| {
                Ok(Some(IssuedRefreshToken {
                    raw_token: "raw-new".into(),
                    record: token_record(12, user_id, &new_token_id),
                }))
            });
        mocks
            .sessions
            .expect_find_active_by_refresh_token_id()
            .returning(|_| Ok(None));
        mocks.sessions.expect_rebind().never();

        let bundle = mocks
            .into_service()
            .refresh("raw-old", None, None, None)
            .await
            .expect("refresh");

        assert!(bundle.session_id.is_none());
        let claims = codec().verify(&bundle.access_token).expect("valid access");
        assert_eq!(claims.session_id, "");
    }

    #[tokio::test]
    async fn revoke_all_devices_takes_precedence_over_specific_target() {
        let mut mocks = Mocks::new();
        mocks
            .refresh_tokens
            .expect_revoke_all()
            .with(eq(7i64))
            .returning(|_| Ok(3));
        mocks
            .sessions
            .expect_end_all()
            .with(eq(7i64))
            .returning(|_| Ok(3));
        mocks.refresh_tokens.expect_revoke().never();
        mocks.sessions.expect_end().never();

        mocks
            .into_service()
            .revoke(7, Some("raw-token".into()), Some("session-abc".into()), true)
            .await
            .expect("revoke all");
    }

    #[tokio::test]
    async fn revoke_without_target_is_bad_request() {
        let mocks = Mocks::new();
        let err = mocks
            .into_service()
            .revoke(7, None, None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn revoke_specific_token_and_session() {
        let mut mocks = Mocks::new();
        mocks
            .refresh_tokens
            .expect_revoke()
            .with(eq("raw-token".to_string()))
            .returning(|_| Ok(()));
        mocks
            .sessions
            .expect_end()
            .with(eq("session-abc".to_string()), eq(7i64))
            .returning(|_, _| Ok(true));

        mocks
            .into_service()
            .revoke(7, Some("raw-token".into()), Some("session-abc".into()), false)
            .await
            .expect("revoke");
    }

    #[tokio::test]
    async fn validate_token_reports_claims_without_touching_stores() {
        let mocks = Mocks::new();
        let service = mocks.into_service();

        let user = test_user("irrelevant");
        let token_id = AccessTokenCodec::new_token_id();
        let issued = codec()
            .issue(&user, "session-abc", &token_id, Some("HRSystem"))
            .expect("issue");

        let result = service.validate_token(&issued.token);
        assert!(result.is_valid);
        assert_eq!(result.user_id, Some(7));
        assert_eq!(result.id_no.as_deref(), Some("A123456789"));
        assert_eq!(result.session_id.as_deref(), Some("session-abc"));
        assert_eq!(result.token_id.as_deref(), Some(token_id.as_str()));
        assert!(result.error_message.is_none());

        let result = service.validate_token("garbage");
        assert!(!result.is_valid);
        assert!(result.user_id.is_none());
        assert!(result.error_message.is_some());
    }
}
