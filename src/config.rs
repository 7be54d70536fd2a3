/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, CORS 許可、Auth cookie / token 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
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

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,

    pub auth_cookie_name: String,
    // None = tokens never expire by idleness
    pub token_idle_timeout: Option<Duration>,
    // only used when token_idle_timeout is set
    pub token_purge_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = parse_positive("PORT", env_var("PORT"), 3000)?;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let database_url = env_var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections: u32 = parse_positive(
            "DATABASE_MAX_CONNECTIONS",
            env_var("DATABASE_MAX_CONNECTIONS"),
            10,
        )?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins =
            parse_origins(&env_var("CORS_ALLOWED_ORIGINS").unwrap_or_default())?;

        let request_timeout = Duration::from_secs(parse_positive(
            "REQUEST_TIMEOUT_SECONDS",
            env_var("REQUEST_TIMEOUT_SECONDS"),
            30,
        )?);

        let request_body_limit_bytes: usize = parse_positive(
            "REQUEST_BODY_LIMIT_BYTES",
            env_var("REQUEST_BODY_LIMIT_BYTES"),
            1024 * 1024,
        )?;

        let auth_cookie_name =
            env_var("AUTH_COOKIE_NAME").unwrap_or_else(|| "sg_token".to_string());
        if !is_valid_cookie_name(&auth_cookie_name) {
            return Err(ConfigError::Invalid("AUTH_COOKIE_NAME"));
        }

        let token_idle_timeout = parse_optional_positive(
            "TOKEN_IDLE_TIMEOUT_SECONDS",
            env_var("TOKEN_IDLE_TIMEOUT_SECONDS"),
        )?
        .map(Duration::from_secs);

        let token_purge_interval = Duration::from_secs(parse_positive(
            "TOKEN_PURGE_INTERVAL_SECONDS",
            env_var("TOKEN_PURGE_INTERVAL_SECONDS"),
            3600,
        )?);

        Ok(Self {
            addr,
            database_url,
            database_max_connections,
            app_env,
            cors_allowed_origins,
            request_timeout,
            request_body_limit_bytes,
            auth_cookie_name,
            token_idle_timeout,
            token_purge_interval,
        })
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Unset ⇒ `default`. Set but unparsable or zero ⇒ `Invalid(key)`.
fn parse_positive<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialOrd,
{
    Ok(parse_optional_positive(key, raw)?.unwrap_or(default))
}

fn parse_optional_positive<T>(key: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr + Default + PartialOrd,
{
    let Some(raw) = raw else {
        return Ok(None);
    };

    raw.trim()
        .parse::<T>()
        .ok()
        .filter(|v| *v > T::default())
        .map(Some)
        .ok_or(ConfigError::Invalid(key))
}

/// Comma-separated list of origins; each must be an absolute http(s) origin.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let parsed = url::Url::parse(s).map_err(|_| ConfigError::Invalid("CORS_ALLOWED_ORIGINS"))?;
            if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                return Err(ConfigError::Invalid("CORS_ALLOWED_ORIGINS"));
            }
            // Origin header never carries a path or trailing slash
            Ok(parsed.origin().ascii_serialization())
        })
        .collect()
}

fn is_valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
}
