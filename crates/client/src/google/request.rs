//! Google Custom Search request options and canonical request URIs.

use crate::ProviderError;
use serde::{Deserialize, Serialize};
use serpcache_core::config::is_valid_geolocation;
use std::str::FromStr;
use url::form_urlencoded;

/// Google never returns more than ten results per call.
pub const MAX_RESULTS_PER_QUERY: usize = 10;

pub const DEFAULT_GEOLOCATION: &str = "us";

const GOOGLE_HOST: &str = "google.com";

/// Safe search levels accepted by Custom Search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum GoogleSafeSearch {
    #[default]
    Off,
    Medium,
    High,
}

impl GoogleSafeSearch {
    pub fn as_str(self) -> &'static str {
        match self {
            GoogleSafeSearch::Off => "off",
            GoogleSafeSearch::Medium => "medium",
            GoogleSafeSearch::High => "high",
        }
    }
}

impl FromStr for GoogleSafeSearch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(GoogleSafeSearch::Off),
            "medium" => Ok(GoogleSafeSearch::Medium),
            "high" => Ok(GoogleSafeSearch::High),
            other => Err(format!("invalid safe search level: {other} (off|medium|high)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleOptions {
    /// Two-letter country code, e.g. `us`.
    pub geolocation: String,
    pub safe_search: GoogleSafeSearch,
}

impl Default for GoogleOptions {
    fn default() -> Self {
        Self { geolocation: DEFAULT_GEOLOCATION.to_string(), safe_search: GoogleSafeSearch::default() }
    }
}

impl GoogleOptions {
    pub fn validate(&self) -> Result<(), ProviderError> {
        if !is_valid_geolocation(&self.geolocation) {
            return Err(ProviderError::InvalidGeolocation(self.geolocation.clone()));
        }
        Ok(())
    }

    /// Canonical URI for `query` at result `offset`. Google's `start` is 1-based.
    ///
    /// Credentials are not included; they are added at request time.
    pub fn canonical_uri(&self, base_url: &str, query: &str, offset: usize) -> Result<String, ProviderError> {
        if query.trim().is_empty() {
            return Err(ProviderError::InvalidQuery("query cannot be empty".to_string()));
        }

        let params = form_urlencoded::Serializer::new(String::new())
            .append_pair("q", query)
            .append_pair("gl", &self.geolocation)
            .append_pair("googleHost", GOOGLE_HOST)
            .append_pair("safe", self.safe_search.as_str())
            .append_pair("start", &(offset + 1).to_string())
            .append_pair("num", &MAX_RESULTS_PER_QUERY.to_string())
            .finish();

        Ok(format!("{base_url}?{params}"))
    }
}
