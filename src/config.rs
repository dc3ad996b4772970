/*
 * Responsibility
 * - 環境変数の読み込み (JWT_SECRET, JWT_TTL_SECONDS, DATABASE_URL, CORS など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - 起動後は不変 (Clone して各所に渡すだけ)
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::{env, fmt};

use thiserror::Error;

use crate::services::auth::password;

const MIN_RECOMMENDED_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Opaque HMAC secret. Never printed.
#[derive(Clone)]
pub struct JwtSecret(Vec<u8>);

impl JwtSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }
        Ok(Self(secret))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JwtSecret(<{} bytes>)", self.0.len())
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub jwt_secret: JwtSecret,
    // may be <= 0 (tokens are then never valid)
    pub jwt_ttl_seconds: i64,
    pub bcrypt_cost: u32,

    // None -> in-memory identity store
    pub database_url: Option<String>,

    pub request_timeout_seconds: u64,
    pub request_body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = parse_or("PORT", 3000)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let jwt_secret =
            JwtSecret::new(env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?)?;
        if jwt_secret.as_bytes().len() < MIN_RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                len = jwt_secret.as_bytes().len(),
                "JWT_SECRET is shorter than {} bytes",
                MIN_RECOMMENDED_SECRET_LEN
            );
        }

        let jwt_ttl_seconds = parse_or("JWT_TTL_SECONDS", 86_400)?; // 24h
        let bcrypt_cost = validate_bcrypt_cost(parse_or("BCRYPT_COST", 10)?)?;

        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let request_timeout_seconds = parse_or("REQUEST_TIMEOUT_SECONDS", 30)?;
        let request_body_limit_bytes = parse_or("REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            jwt_secret,
            jwt_ttl_seconds,
            bcrypt_cost,
            database_url,
            request_timeout_seconds,
            request_body_limit_bytes,
        })
    }
}

// Unset -> default; set but unparseable -> Invalid (fail at start-up, not silently).
fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::Invalid(key))
        }
        _ => Ok(default),
    }
}

fn validate_bcrypt_cost(cost: u32) -> Result<u32, ConfigError> {
    if (password::MIN_COST..=password::MAX_COST).contains(&cost) {
        Ok(cost)
    } else {
        Err(ConfigError::Invalid("BCRYPT_COST"))
    }
}
