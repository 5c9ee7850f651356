//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOCKROOM_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOCKROOM_HOST` - Bind address (default: 127.0.0.1)
//! - `STOCKROOM_PORT` - Listen port (default: 8000)
//! - `STOCKROOM_BASE_URL` - Public URL used in pagination links and image URLs
//!   (default: `http://localhost:8000`)
//! - `STOCKROOM_STORAGE_DIR` - Root directory for uploaded files (default: storage/app/public)
//! - `STOCKROOM_TOKEN_TTL_HOURS` - Lifetime of login tokens; `0` disables expiry (default: 24)
//! - `STOCKROOM_MAX_UPLOAD_KB` - Largest accepted product image (default: 2048)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate, 0.0-1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, without a trailing slash
    pub base_url: String,
    /// Directory that holds uploaded files
    pub storage_dir: PathBuf,
    /// Lifetime of tokens issued at login (`None` = never expire)
    pub token_ttl: Option<Duration>,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,
    /// Sentry error tracking
    pub sentry: SentryConfig,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("storage_dir", &self.storage_dir)
            .field("token_ttl", &self.token_ttl)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("sentry", &self.sentry)
            .finish()
    }
}

/// Sentry settings.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let database_url = env
            .optional("STOCKROOM_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("STOCKROOM_DATABASE_URL".to_string()))?;

        let host = env.parse_or("STOCKROOM_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or("STOCKROOM_PORT", 8000_u16)?;
        let base_url = env
            .or_default("STOCKROOM_BASE_URL", "http://localhost:8000")
            .trim_end_matches('/')
            .to_string();
        let storage_dir = PathBuf::from(env.or_default("STOCKROOM_STORAGE_DIR", "storage/app/public"));

        let ttl_hours = env.parse_or("STOCKROOM_TOKEN_TTL_HOURS", 24_i64)?;
        if ttl_hours < 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STOCKROOM_TOKEN_TTL_HOURS".to_string(),
                "must not be negative".to_string(),
            ));
        }
        let token_ttl = (ttl_hours > 0).then(|| Duration::hours(ttl_hours));

        let max_upload_kb = env.parse_or("STOCKROOM_MAX_UPLOAD_KB", 2048_usize)?;
        if max_upload_kb == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STOCKROOM_MAX_UPLOAD_KB".to_string(),
                "must be greater than 0".to_string(),
            ));
        }

        let sentry = SentryConfig {
            dsn: env.optional("SENTRY_DSN"),
            environment: env.optional("SENTRY_ENVIRONMENT"),
            sample_rate: env.rate_or("SENTRY_SAMPLE_RATE", 1.0)?,
            traces_sample_rate: env.rate_or("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            storage_dir,
            token_ttl,
            max_upload_bytes: max_upload_kb.saturating_mul(1024),
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Absolute URL for a path on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get an optional variable; empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    fn rate_or(&self, key: &str, default: f32) -> Result<f32, ConfigError> {
        let rate = self.parse_or(key, default)?;
        if (0.0..=1.0).contains(&rate) {
            Ok(rate)
        } else {
            Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be between 0.0 and 1.0".to_string(),
            ))
        }
    }
}
