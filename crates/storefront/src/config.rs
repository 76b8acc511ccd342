//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `OCEANFOOD_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; when neither is set the service runs on in-memory storage)
//! - `OCEANFOOD_HOST` - Bind address (default: 127.0.0.1)
//! - `OCEANFOOD_PORT` - Listen port (default: 3000)
//! - `OCEANFOOD_OPERATION_TIMEOUT_MS` - Deadline for each cart, favorites,
//!   catalog and flash-sale operation (default: 5000)
//! - `OCEANFOOD_FLASH_SALE_CACHE_TTL_SECS` - TTL of the active flash-sale
//!   listing cache, 0 disables it (default: 30)
//! - `OCEANFOOD_SEED_FILE` - JSON product file loaded into the catalog when
//!   running on in-memory storage (same format as `oceanfood-cli seed`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate in [0, 1] (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate in [0, 1] (default: 0.0)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Deadline applied to every service operation
    pub operation_timeout: Duration,
    /// TTL of the active flash-sale cache; zero disables caching
    pub flash_sale_cache_ttl: Duration,
    /// Products loaded at startup on in-memory storage
    pub seed_file: Option<PathBuf>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            operation_timeout: Duration::from_millis(5000),
            flash_sale_cache_ttl: Duration::from_secs(30),
            seed_file: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("OCEANFOOD_DATABASE_URL");
        let host = parse_env("OCEANFOOD_HOST", "127.0.0.1")?;
        let port = parse_env("OCEANFOOD_PORT", "3000")?;
        let operation_timeout =
            Duration::from_millis(parse_env("OCEANFOOD_OPERATION_TIMEOUT_MS", "5000")?);
        if operation_timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "OCEANFOOD_OPERATION_TIMEOUT_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let flash_sale_cache_ttl =
            Duration::from_secs(parse_env("OCEANFOOD_FLASH_SALE_CACHE_TTL_SECS", "30")?);

        Ok(Self {
            database_url,
            host,
            port,
            operation_timeout,
            flash_sale_cache_ttl,
            seed_file: get_optional_env("OCEANFOOD_SEED_FILE").map(PathBuf::from),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_rate("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_rate("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    get_optional_env(primary_key)
        .or_else(|| get_optional_env("DATABASE_URL"))
        .map(SecretString::from)
}

/// Get an optional environment variable; empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a sample rate, which must lie in [0, 1].
fn parse_rate(key: &str, default: &str) -> Result<f32, ConfigError> {
    check_rate(key, parse_env(key, default)?)
}

fn check_rate(key: &str, rate: f32) -> Result<f32, ConfigError> {
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0 and 1 (got {rate})"),
        ))
    }
}
