//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.
//! The locale format checks are shared with the provider adapters.

use std::sync::LazyLock;

use crate::config::AppConfig;
use regex::Regex;
use thiserror::Error;

static MARKET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z]{2}-[A-Z]{2}$").unwrap());
static GEOLOCATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z]{2}$").unwrap());

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::InvalidArgument(err.to_string())
    }
}

/// Market codes look like `en-US`.
pub fn is_valid_market(market: &str) -> bool {
    MARKET_RE.is_match(market)
}

/// Geolocation codes look like `us`.
pub fn is_valid_geolocation(geolocation: &str) -> bool {
    GEOLOCATION_RE.is_match(geolocation)
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_attempts` is 0 or exceeds 10
    /// - `retry_delay_ms` exceeds 1 minute
    /// - `user_agent` is empty
    /// - `market` or `geolocation` is malformed
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if !(1..=10).contains(&self.max_attempts) {
            return Err(ConfigError::Invalid { field: "max_attempts".into(), reason: "must be between 1 and 10".into() });
        }

        if self.retry_delay_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "retry_delay_ms".into(),
                reason: "must not exceed 1 minute (60000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if !is_valid_market(&self.market) {
            return Err(ConfigError::Invalid { field: "market".into(), reason: "must be in the form en-US".into() });
        }

        if !is_valid_geolocation(&self.geolocation) {
            return Err(ConfigError::Invalid { field: "geolocation".into(), reason: "must be in the form us".into() });
        }

        if self.retry_delay_ms == 0 && self.max_attempts > 1 {
            tracing::warn!(
                max_attempts = self.max_attempts,
                "retry_delay_ms is 0; malformed responses will be retried immediately"
            );
        }

        Ok(())
    }
}
