//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SERPCACHE_*)
//! 2. TOML config file, when one is given (the CLI takes it from `--config`
//!    or SERPCACHE_CONFIG_FILE)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::search::RetryPolicy;

mod validation;

pub use validation::{ConfigError, is_valid_geolocation, is_valid_market};

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SERPCACHE_*)
/// 2. TOML config file
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache file.
    ///
    /// Set via SERPCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Subscription key for the Bing Web Search API.
    ///
    /// Set via SERPCACHE_BING_API_KEY. Required only for Bing queries.
    #[serde(default)]
    pub bing_api_key: Option<String>,

    /// API key for Google Custom Search.
    ///
    /// Set via SERPCACHE_GOOGLE_API_KEY. Required only for Google queries.
    #[serde(default)]
    pub google_api_key: Option<String>,

    /// Custom search engine id (`cx`) for Google Custom Search.
    ///
    /// Set via SERPCACHE_GOOGLE_CSE_ID.
    #[serde(default)]
    pub google_cse_id: Option<String>,

    /// Bing market, e.g. `en-US`.
    #[serde(default = "default_market")]
    pub market: String,

    /// Google geolocation, e.g. `us`.
    #[serde(default = "default_geolocation")]
    pub geolocation: String,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Live fetch attempts per query, the first included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause before each retry of a malformed fetch, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./serpcache.sqlite")
}

fn default_market() -> String {
    "en-US".into()
}

fn default_geolocation() -> String {
    "us".into()
}

fn default_user_agent() -> String {
    "serpcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bing_api_key: None,
            google_api_key: None,
            google_cse_id: None,
            market: default_market(),
            geolocation: default_geolocation(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Retry behaviour for aggregators built from this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    /// Load configuration with an explicit TOML file.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SERPCACHE_`
    /// 2. `config_file` (if given)
    /// 3. Built-in defaults via `Default::default()`
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(
            Env::prefixed("SERPCACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Bing subscription key (deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set.
    pub fn require_bing_api_key(&self) -> Result<&str, ConfigError> {
        self.bing_api_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "bing_api_key".into(),
            hint: "Set SERPCACHE_BING_API_KEY environment variable".into(),
        })
    }

    /// Google API key and custom search engine id (deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first absent value.
    pub fn require_google_credentials(&self) -> Result<(&str, &str), ConfigError> {
        let key = self.google_api_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "google_api_key".into(),
            hint: "Set SERPCACHE_GOOGLE_API_KEY environment variable".into(),
        })?;
        let cse_id = self.google_cse_id.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "google_cse_id".into(),
            hint: "Set SERPCACHE_GOOGLE_CSE_ID environment variable".into(),
        })?;
        Ok((key, cse_id))
    }
}
