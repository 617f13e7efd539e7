//! Stateless access-token codec.
//!
//! Tokens are HS256-signed bearer credentials scoped to exactly one audience
//! out of the deployment's allow-list. Verification checks signature, exact
//! issuer, audience membership and expiry with zero clock-skew tolerance, and
//! returns an explicit error instead of panicking or propagating library
//! errors upstream.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{config::Config, models::user::User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, stringly typed per JWT convention.
    pub sub: String,
    #[serde(rename = "idNo")]
    pub id_no: String,
    pub name: String,
    /// Public session id. Empty when the token is not bound to a session.
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub jti: String,
    /// The single downstream system this token is scoped to.
    pub aud: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("Token has expired")]
    Expired,
    #[error("Token signature is invalid")]
    InvalidSignature,
    #[error("Token issuer is not trusted")]
    InvalidIssuer,
    #[error("Token audience is not accepted")]
    InvalidAudience,
    #[error("Token is malformed or uses an unsupported algorithm")]
    Malformed,
}

#[derive(Debug, Clone)]
pub struct IssuedAccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AccessTokenCodec {
    secret: String,
    issuer: String,
    audiences: Vec<String>,
    expiration_minutes: i64,
}

impl AccessTokenCodec {
    pub fn new(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        audiences: Vec<String>,
        expiration_minutes: i64,
    ) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            audiences,
            expiration_minutes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            config.jwt_issuer.clone(),
            config.jwt_audiences.clone(),
            config.access_token_expiration_minutes,
        )
    }

    /// Fresh correlation id, shared between an access token and the refresh
    /// record it is paired with.
    pub fn new_token_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// The supplied target system when it is in the allow-list, else the
    /// first configured audience.
    fn resolve_audience(&self, target_system: Option<&str>) -> String {
        match target_system {
            Some(target) if self.audiences.iter().any(|a| a == target) => target.to_string(),
            _ => self.audiences.first().cloned().unwrap_or_default(),
        }
    }

    pub fn issue(
        &self,
        user: &User,
        session_id: &str,
        token_id: &str,
        target_system: Option<&str>,
    ) -> anyhow::Result<IssuedAccessToken> {
        let now = Utc::now();
        let expires_at = now + Duration::minutes(self.expiration_minutes);

        let claims = Claims {
            sub: user.id.to_string(),
            id_no: user.id_no.clone(),
            name: user.name.clone(),
            session_id: session_id.to_string(),
            jti: token_id.to_string(),
            aud: self.resolve_audience(target_system),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?;

        Ok(IssuedAccessToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&self.audiences);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => TokenValidationError::Expired,
            ErrorKind::InvalidSignature => TokenValidationError::InvalidSignature,
            ErrorKind::InvalidIssuer => TokenValidationError::InvalidIssuer,
            ErrorKind::InvalidAudience => TokenValidationError::InvalidAudience,
            _ => TokenValidationError::Malformed,
        })
    }
}
