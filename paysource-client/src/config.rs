//! Configuration loading from environment.

use std::env;
use std::time::Duration;

/// Public API host.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Transport timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PAYSOURCE_TIMEOUT_SECS value: {0}")]
    InvalidTimeout(String),

    #[error("Invalid PAYSOURCE_API_BASE value: {0}")]
    InvalidApiBase(String),
}

/// Client configuration.
///
/// The publishable key is kept raw here; it is validated when the client is built.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub publishable_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            publishable_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from environment variables.
    ///
    /// - `PAYSOURCE_API_BASE` (default: the public API host)
    /// - `PAYSOURCE_PUBLISHABLE_KEY` (optional default key)
    /// - `PAYSOURCE_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base = lookup("PAYSOURCE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.into());
        if !(api_base.starts_with("https://") || api_base.starts_with("http://")) {
            return Err(ConfigError::InvalidApiBase(api_base));
        }

        let timeout = match lookup("PAYSOURCE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
            ),
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            publishable_key: lookup("PAYSOURCE_PUBLISHABLE_KEY"),
            timeout,
        })
    }
}
