//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PORTAL_API_URL` - Base URL of the backend REST API
//! - `PORTAL_BASE_URL` - Public URL of the portal itself
//!
//! ## Optional
//! - `PORTAL_HOST` - Bind address (default: 127.0.0.1)
//! - `PORTAL_PORT` - Listen port (default: 3000)
//! - `PORTAL_API_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `MAILBOX_STREET_PREFIX` - Warehouse street line printed on mailbox addresses
//! - `MAILBOX_TAG` - Routing tag printed before the branch name (default: CPX)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use courier_core::AddressGenerator;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Portal application configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the portal
    pub base_url: String,
    /// Backend REST API configuration
    pub api: ApiConfig,
    /// Mailbox address settings
    pub mailbox: MailboxConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced by Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Backend REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, without a trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Mailbox address settings.
#[derive(Debug, Clone)]
pub struct MailboxConfig {
    /// Warehouse street line
    pub street_prefix: String,
    /// Routing tag
    pub tag: String,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            street_prefix: AddressGenerator::DEFAULT_STREET_PREFIX.to_string(),
            tag: AddressGenerator::DEFAULT_TAG.to_string(),
        }
    }
}

impl PortalConfig {
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

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env.parse_or("PORTAL_HOST", "127.0.0.1")?;
        let port = env.parse_or("PORTAL_PORT", "3000")?;
        let base_url = validate_url("PORTAL_BASE_URL", &env.required("PORTAL_BASE_URL")?)?;

        let api = ApiConfig {
            base_url: validate_url("PORTAL_API_URL", &env.required("PORTAL_API_URL")?)?,
            timeout: Duration::from_secs(env.parse_or("PORTAL_API_TIMEOUT_SECS", "10")?),
        };

        let defaults = MailboxConfig::default();
        let mailbox = MailboxConfig {
            street_prefix: env
                .optional("MAILBOX_STREET_PREFIX")
                .unwrap_or(defaults.street_prefix),
            tag: env.optional("MAILBOX_TAG").unwrap_or(defaults.tag),
        };
        // Fail at startup rather than on the first settings save.
        AddressGenerator::new(&mailbox.street_prefix, &mailbox.tag).map_err(|e| {
            ConfigError::InvalidEnvVar("MAILBOX_STREET_PREFIX/MAILBOX_TAG".to_string(), e.to_string())
        })?;

        Ok(Self {
            host,
            port,
            base_url,
            api,
            mailbox,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the portal is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with typed helpers.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.optional(key).unwrap_or_else(|| default.to_string());
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

/// Check that a URL is absolute http(s) with a host; returns it without a trailing slash.
fn validate_url(key: &str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "URL must have a host".to_string(),
        ));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<PortalConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        PortalConfig::from_lookup(|key| map.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("PORTAL_API_URL", "http://api.internal:8080/"),
        ("PORTAL_BASE_URL", "https://portal.example.com"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert_eq!(config.api.base_url, "http://api.internal:8080");
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.mailbox.tag, AddressGenerator::DEFAULT_TAG);
        assert!(config.sentry_dsn.is_none());
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
        assert!(config.is_secure());
    }

    #[test]
    fn test_missing_api_url() {
        let err = load(&[("PORTAL_BASE_URL", "http://localhost:3000")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "PORTAL_API_URL"));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let err = load(&[
            ("PORTAL_API_URL", "   "),
            ("PORTAL_BASE_URL", "http://localhost:3000"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORTAL_PORT", "not-a-port"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "PORTAL_PORT"));
    }

    #[test]
    fn test_rejects_non_http_api_url() {
        let err = load(&[
            ("PORTAL_API_URL", "ftp://files.example.com"),
            ("PORTAL_BASE_URL", "http://localhost:3000"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "PORTAL_API_URL"));
    }

    #[test]
    fn test_rejects_invalid_mailbox_tag() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("MAILBOX_TAG", "C-P-X"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_custom_mailbox_and_timeout() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("MAILBOX_STREET_PREFIX", "1 Dock Road, Miami, FL 33142"));
        vars.push(("MAILBOX_TAG", "JMX"));
        vars.push(("PORTAL_API_TIMEOUT_SECS", "3"));
        let config = load(&vars).unwrap();

        assert_eq!(config.mailbox.street_prefix, "1 Dock Road, Miami, FL 33142");
        assert_eq!(config.mailbox.tag, "JMX");
        assert_eq!(config.api.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_socket_addr() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORTAL_HOST", "0.0.0.0"));
        vars.push(("PORTAL_PORT", "8081"));
        let config = load(&vars).unwrap();

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "0.0.0.0");
        assert_eq!(addr.port(), 8081);
    }
}
