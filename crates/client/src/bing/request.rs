//! Bing Web Search request options and canonical request URIs.

use crate::ProviderError;
use serde::{Deserialize, Serialize};
use serpcache_core::config::is_valid_market;
use std::str::FromStr;
use url::form_urlencoded;

/// Results requested per page; also the page size used to detect exhaustion.
pub const MAX_RESULTS_PER_QUERY: usize = 50;

/// Default market.
pub const DEFAULT_MARKET: &str = "en-US";

/// Default answer types requested.
pub const DEFAULT_RESPONSE_FILTER: &str = "RelatedSearches,SpellSuggestions,Webpages";

/// Highlight markers are always requested so snippets carry them.
const TEXT_DECORATIONS: bool = true;

/// Safe search filtering levels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SafeSearch {
    #[default]
    Off,
    Moderate,
    Strict,
}

impl SafeSearch {
    pub fn as_str(self) -> &'static str {
        match self {
            SafeSearch::Off => "Off",
            SafeSearch::Moderate => "Moderate",
            SafeSearch::Strict => "Strict",
        }
    }
}

impl FromStr for SafeSearch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(SafeSearch::Off),
            "moderate" => Ok(SafeSearch::Moderate),
            "strict" => Ok(SafeSearch::Strict),
            other => Err(format!("invalid safe search level: {other} (off|moderate|strict)")),
        }
    }
}

/// Provider parameters that are part of every request identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BingOptions {
    /// Market, e.g. `en-US`.
    pub market: String,
    /// Comma-separated answer types.
    pub response_filter: String,
    pub safe_search: SafeSearch,
}

impl Default for BingOptions {
    fn default() -> Self {
        Self {
            market: DEFAULT_MARKET.to_string(),
            response_filter: DEFAULT_RESPONSE_FILTER.to_string(),
            safe_search: SafeSearch::default(),
        }
    }
}

impl BingOptions {
    pub fn validate(&self) -> Result<(), ProviderError> {
        if !is_valid_market(&self.market) {
            return Err(ProviderError::InvalidMarket(self.market.clone()));
        }
        Ok(())
    }

    /// Canonical URI for `query` at result `offset`.
    ///
    /// Parameter order is fixed so the same inputs always give the same string.
    pub fn canonical_uri(&self, base_url: &str, query: &str, offset: usize) -> Result<String, ProviderError> {
        if query.trim().is_empty() {
            return Err(ProviderError::InvalidQuery("query cannot be empty".to_string()));
        }

        let params = form_urlencoded::Serializer::new(String::new())
            .append_pair("q", query)
            .append_pair("count", &MAX_RESULTS_PER_QUERY.to_string())
            .append_pair("mkt", &self.market)
            .append_pair("responseFilter", &self.response_filter)
            .append_pair("safeSearch", self.safe_search.as_str())
            .append_pair("textDecorations", &TEXT_DECORATIONS.to_string())
            .append_pair("offset", &offset.to_string())
            .finish();

        Ok(format!("{base_url}?{params}"))
    }
}
