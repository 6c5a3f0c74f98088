//! Themedrop configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `THEMEDROP_DATABASE_URL` - `PostgreSQL` connection string for the session store
//!   (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `THEMEDROP_HOST` - Bind address (default: 127.0.0.1)
//! - `THEMEDROP_PORT` - Listen port (default: 3002)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2026-01)
//! - `SHOPIFY_ADMIN_ORIGIN` - Origin override for the GraphQL endpoint
//!   (e.g. an egress proxy); defaults to `https://<shop>`
//! - `SHOPIFY_REQUEST_TIMEOUT_SECS` - Deadline for each outbound request
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry traces sample rate (default: 1.0)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Default Admin API version.
pub const DEFAULT_API_VERSION: &str = "2026-01";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Themedrop application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shopify Admin API configuration
    pub shopify: ShopifyAdminConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// Apply the bundled migrations on startup.
    pub run_migrations: bool,
}

/// Shopify Admin API configuration.
///
/// Holds no credentials: access tokens are resolved per shop from the
/// session store on every call.
#[derive(Debug, Clone)]
pub struct ShopifyAdminConfig {
    /// Shopify API version (e.g., 2026-01)
    pub api_version: String,
    /// Replaces `https://<shop>` as the GraphQL endpoint origin when set
    pub admin_origin: Option<String>,
    /// Deadline applied to each outbound request
    pub request_timeout: Option<Duration>,
}

impl Default for ShopifyAdminConfig {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            admin_origin: None,
            request_timeout: None,
        }
    }
}

impl AppConfig {
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

        let database_url = get_database_url("THEMEDROP_DATABASE_URL")?;
        let host = get_env_or_default("THEMEDROP_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("THEMEDROP_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("THEMEDROP_PORT", "3002")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("THEMEDROP_PORT".to_string(), e.to_string()))?;

        let shopify = ShopifyAdminConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        let run_migrations = get_optional_env("THEMEDROP_RUN_MIGRATIONS")
            .map(|raw| {
                raw.parse::<bool>().map_err(|e| {
                    ConfigError::InvalidEnvVar("THEMEDROP_RUN_MIGRATIONS".to_string(), e.to_string())
                })
            })
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            database_url,
            host,
            port,
            shopify,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            run_migrations,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyAdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let admin_origin = get_optional_env("SHOPIFY_ADMIN_ORIGIN")
            .map(|origin| normalize_origin("SHOPIFY_ADMIN_ORIGIN", &origin))
            .transpose()?;

        let request_timeout = get_optional_env("SHOPIFY_REQUEST_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "SHOPIFY_REQUEST_TIMEOUT_SECS".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?;

        Ok(Self {
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            admin_origin,
            request_timeout,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Require an `http(s)://` origin and drop any trailing slash.
fn normalize_origin(key: &str, origin: &str) -> Result<String, ConfigError> {
    let origin = origin.trim().trim_end_matches('/');
    if !(origin.starts_with("https://") || origin.starts_with("http://")) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must start with http:// or https://".to_string(),
        ));
    }
    Ok(origin.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3002,
            shopify: ShopifyAdminConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            run_migrations: false,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3002);
    }

    #[test]
    fn test_default_api_version() {
        let config = ShopifyAdminConfig::default();
        assert_eq!(config.api_version, "2026-01");
        assert!(config.admin_origin.is_none());
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_normalize_origin_strips_trailing_slash() {
        let origin = normalize_origin("TEST", "http://127.0.0.1:9000/").unwrap();
        assert_eq!(origin, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_normalize_origin_requires_scheme() {
        let result = normalize_origin("TEST", "proxy.internal:8080");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_app_config_debug_redacts_database_url() {
        let config = AppConfig {
            database_url: SecretString::from("postgres://user:hunter2@db/themedrop"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3002,
            shopify: ShopifyAdminConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            run_migrations: false,
        };

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
