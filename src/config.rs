/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, CORS 許可、Appwrite 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Appwrite project the bearer tokens are issued by.
#[derive(Debug, Clone)]
pub struct AppwriteConfig {
    /// e.g. `https://fra.cloud.appwrite.io/v1`
    pub endpoint: Url,
    pub project_id: String,
    pub timeout: Duration,
}

pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub http_timeout: Duration,
    pub body_limit_bytes: usize,

    pub appwrite: AppwriteConfig,

    pub valkey_url: Option<String>,
    pub verify_cache_ttl_seconds: u64,

    pub location_channel_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = parse_or("PORT", 3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections = parse_or("DATABASE_MAX_CONNECTIONS", 10);

        let run_migrations = std::env::var("RUN_MIGRATIONS")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);

        let app_env = AppEnv::from_env();

        let cors_allowed_origins =
            parse_origins(&std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default());

        let http_timeout = Duration::from_secs(parse_or("HTTP_TIMEOUT_SECONDS", 30));
        let body_limit_bytes = parse_or("HTTP_BODY_LIMIT_BYTES", 64 * 1024);

        let endpoint = std::env::var("APPWRITE_ENDPOINT")
            .map_err(|_| ConfigError::Missing("APPWRITE_ENDPOINT"))?;
        let endpoint = parse_endpoint(&endpoint)?;

        let project_id = std::env::var("APPWRITE_PROJECT_ID")
            .map_err(|_| ConfigError::Missing("APPWRITE_PROJECT_ID"))?;
        if project_id.trim().is_empty() {
            return Err(ConfigError::Invalid("APPWRITE_PROJECT_ID"));
        }

        let timeout = Duration::from_secs(parse_or("APPWRITE_TIMEOUT_SECONDS", 10));

        let valkey_url = std::env::var("VALKEY_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let verify_cache_ttl_seconds = parse_or("VERIFY_CACHE_TTL_SECONDS", 60);

        let location_channel_capacity: usize = parse_or("LOCATION_CHANNEL_CAPACITY", 256);
        if location_channel_capacity == 0 {
            return Err(ConfigError::Invalid("LOCATION_CHANNEL_CAPACITY"));
        }

        Ok(Self {
            addr,
            database_url,
            database_max_connections,
            run_migrations,
            app_env,
            cors_allowed_origins,
            http_timeout,
            body_limit_bytes,
            appwrite: AppwriteConfig {
                endpoint,
                project_id: project_id.trim().to_string(),
                timeout,
            },
            valkey_url,
            verify_cache_ttl_seconds,
            location_channel_capacity,
        })
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Only http(s) endpoints; trailing slash is dropped so paths can be appended.
fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|_| ConfigError::Invalid("APPWRITE_ENDPOINT"))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::Invalid("APPWRITE_ENDPOINT")),
    }
}
