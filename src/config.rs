//! # Configuration Management
//!
//! This module provides configuration management for the client core.
//! Configuration is optionally supplied as a JSON document by the hosting page
//! and loaded at startup with defaults for every setting.
//!
//! ## Configuration Sources
//!
//! 1. **JSON override**: Provided by the host (e.g. an inline script tag)
//! 2. **Compile-time env**: `TIME_CAPSULE_API_BASE_URL` for the API base URL
//! 3. **Defaults**: Fallback values for everything else
//!
//! ## Configuration Options
//!
//! - `api_base_url`: Base URL every endpoint path is joined onto
//! - `auth_scheme`: Prefix of the `Authorization` header value
//! - `redirect_delay_ms`: Delay before deferred redirects (default: 2000)
//! - `verification_redirect_delay_ms`: Delay before sending an unverified
//!   account to verification (default: 1000)
//! - `notice_duration_ms`: How long a transient notice stays visible
//! - `min_password_length`: Client-side password length check
//!
//! ## Example
//!
//! ```rust
//! use time_capsule_client::config::Config;
//!
//! let config = Config::load(Some(r#"{ "api_base_url": "https://api.example.com/" }"#)).unwrap();
//! assert_eq!(config.redirect_delay_ms, 2000);
//! ```

use std::time::Duration;

use crate::constants::{
    API_BASE_URL_ENV, DEFAULT_API_BASE_URL, DEFAULT_AUTH_SCHEME, DEFAULT_MIN_PASSWORD_LENGTH,
    DEFAULT_NOTICE_DURATION_MS, DEFAULT_REDIRECT_DELAY_MS,
    DEFAULT_VERIFICATION_REDIRECT_DELAY_MS,
};
use crate::errors::AppResult;
use crate::log_data;
use crate::logging::Logger;
use serde::{Deserialize, Serialize};

/// Configuration structure for the client core.
///
/// All fields are public to allow easy access throughout the application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote API. Endpoint paths are joined onto it.
    pub api_base_url: String,

    /// Scheme placed before the token in the `Authorization` header.
    pub auth_scheme: String,

    /// Delay before deferred navigation after a success notice.
    pub redirect_delay_ms: u64,

    /// Delay before redirecting an unverified account to OTP verification.
    pub verification_redirect_delay_ms: u64,

    /// Default visibility of transient notices. Zero keeps them until hidden.
    pub notice_duration_ms: u64,

    /// Minimum password length checked before registration or reset.
    pub min_password_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: option_env!("TIME_CAPSULE_API_BASE_URL")
                .unwrap_or(DEFAULT_API_BASE_URL)
                .to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            redirect_delay_ms: DEFAULT_REDIRECT_DELAY_MS,
            verification_redirect_delay_ms: DEFAULT_VERIFICATION_REDIRECT_DELAY_MS,
            notice_duration_ms: DEFAULT_NOTICE_DURATION_MS,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

impl Config {
    /// Loads configuration from an optional JSON document with fallback to defaults.
    ///
    /// Missing keys take their default values; an absent or blank document
    /// yields `Config::default()`.
    ///
    /// # Errors
    ///
    /// Invalid JSON is reported as `AppError::Serialization` rather than
    /// silently ignored.
    pub fn load(source: Option<&str>) -> AppResult<Self> {
        let logger = Logger::for_component("config");

        match source.map(str::trim).filter(|s| !s.is_empty()) {
            Some(json) => {
                let config: Config = serde_json::from_str(json)?;
                logger.info(
                    "Configuration loaded from host document",
                    log_data!("api_base_url" => config.api_base_url),
                );
                Ok(config)
            }
            None => {
                logger.info(
                    "No configuration supplied, using defaults",
                    log_data!("env" => API_BASE_URL_ENV),
                );
                Ok(Self::default())
            }
        }
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    pub fn verification_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.verification_redirect_delay_ms)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_keeps_defaults() {
        let config = Config::load(Some(r#"{ "api_base_url": "https://api.example.com/" }"#))
            .unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com/");
        assert_eq!(config.auth_scheme, "Token");
        assert_eq!(config.redirect_delay(), Duration::from_millis(2000));
    }

    #[test]
    fn blank_document_uses_defaults() {
        assert_eq!(Config::load(Some("  ")).unwrap(), Config::default());
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }

    #[test]
    fn invalid_document_is_an_error() {
        assert!(Config::load(Some("{ not json")).is_err());
    }
}
