use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audiences: Vec<String>,
    pub access_token_expiration_minutes: i64,
    pub refresh_token_expiration_days: i64,
    pub lockout_max_failed_attempts: u32,
    pub lockout_window_minutes: i64,
    pub login_history_retention_days: i64,
    pub cleanup_interval_secs: u64,
    pub cors_allow_origins: Vec<String>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow!("DATABASE_URL must be set"))?;

        let port = parse_env("PORT", 5000)?;

        let jwt_secret =
            env::var("JWT_SECRET_KEY").map_err(|_| anyhow!("JWT_SECRET_KEY must be set"))?;
        if jwt_secret.len() < 32 {
            bail!("JWT_SECRET_KEY must be at least 32 bytes");
        }

        let jwt_issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "AuthCenter.Api".to_string());

        let jwt_audiences = parse_list(&env::var("JWT_AUDIENCES").unwrap_or_else(|_| {
            "HRSystem,FinanceSystem,InventorySystem,ERPSystem,CRMSystem".to_string()
        }));
        if jwt_audiences.is_empty() {
            bail!("JWT_AUDIENCES must contain at least one audience");
        }

        let access_token_expiration_minutes = parse_env("JWT_EXPIRATION_MINUTES", 30)?;
        let refresh_token_expiration_days = parse_env("JWT_REFRESH_TOKEN_EXPIRATION_DAYS", 7)?;
        let lockout_max_failed_attempts = parse_env("LOCKOUT_MAX_FAILED_ATTEMPTS", 5)?;
        let lockout_window_minutes = parse_env("LOCKOUT_WINDOW_MINUTES", 15)?;
        let login_history_retention_days = parse_env("LOGIN_HISTORY_RETENTION_DAYS", 90)?;
        let cleanup_interval_secs = parse_env("CLEANUP_INTERVAL_SECS", 3600)?;

        let cors_allow_origins = parse_list(
            &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".into()),
        );

        Ok(Config {
            database_url,
            port,
            jwt_secret,
            jwt_issuer,
            jwt_audiences,
            access_token_expiration_minutes,
            refresh_token_expiration_days,
            lockout_max_failed_attempts,
            lockout_window_minutes,
            login_history_retention_days,
            cleanup_interval_secs,
            cors_allow_origins,
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
