//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SECUREBANK_API_BASE_URL` - Banking API base URL (default: `http://localhost:8080/api`)
//! - `SECUREBANK_CREDENTIALS_PATH` - Where the persisted credential lives
//!   (default: `<data dir>/securebank/credentials.json`)
//! - `SECUREBANK_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// API base used when `SECUREBANK_API_BASE_URL` is unset (local backend).
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// SecureBank client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every API path is resolved against
    pub api_base_url: Url,
    /// File holding the persisted credential
    pub credentials_path: PathBuf,
    /// Timeout applied to each HTTP request
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Build a configuration for the given API base with defaults elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_base_url` is not an http(s) URL.
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_api_base_url(api_base_url)?,
            credentials_path: default_credentials_path(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_base_url = parse_api_base_url(
            &get("SECUREBANK_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        )?;

        let credentials_path = get("SECUREBANK_CREDENTIALS_PATH")
            .map_or_else(default_credentials_path, PathBuf::from);

        let http_timeout = match get("SECUREBANK_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "SECUREBANK_HTTP_TIMEOUT_SECS".to_string(),
                        e.to_string(),
                    )
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidEnvVar(
                        "SECUREBANK_HTTP_TIMEOUT_SECS".to_string(),
                        "must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_base_url,
            credentials_path,
            http_timeout,
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }

    /// Resolve an API path (e.g. `/auth/login`) against the base URL.
    ///
    /// The base URL's own path is kept, so `/auth/login` against
    /// `http://host/api` becomes `http://host/api/auth/login`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_api_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| {
        ConfigError::InvalidEnvVar("SECUREBANK_API_BASE_URL".to_string(), reason)
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(url)
}

/// `<data dir>/securebank/credentials.json`, or a relative fallback when the
/// platform has no data directory.
fn default_credentials_path() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(".securebank/credentials.json"),
        |dir| dir.join("securebank").join("credentials.json"),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:8080/api");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(config.credentials_path.ends_with("credentials.json"));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("SECUREBANK_API_BASE_URL", "https://bank.example/api/"),
            ("SECUREBANK_CREDENTIALS_PATH", "/tmp/sb/creds.json"),
            ("SECUREBANK_HTTP_TIMEOUT_SECS", "5"),
            ("SENTRY_ENVIRONMENT", "staging"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url.host_str(), Some("bank.example"));
        assert_eq!(config.credentials_path, PathBuf::from("/tmp/sb/creds.json"));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.sentry_environment.as_deref(), Some("staging"));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config =
            ClientConfig::from_lookup(lookup(&[("SECUREBANK_API_BASE_URL", "  ")])).unwrap();
        assert_eq!(config.api_base_url.as_str(), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let err = ClientConfig::from_lookup(lookup(&[("SECUREBANK_API_BASE_URL", "ftp://x")]))
            .unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));

        assert!(ClientConfig::new("not a url").is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result =
            ClientConfig::from_lookup(lookup(&[("SECUREBANK_HTTP_TIMEOUT_SECS", "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let config = ClientConfig::new("http://localhost:8080/api").unwrap();
        assert_eq!(
            config.endpoint("/auth/login"),
            "http://localhost:8080/api/auth/login"
        );

        let config = ClientConfig::new("http://localhost:8080/api/").unwrap();
        assert_eq!(
            config.endpoint("auth/validate"),
            "http://localhost:8080/api/auth/validate"
        );
    }
}
