//! Bing Web Search adapter.
//!
//! ### Specification
//!
//! - **Endpoint**: `https://api.cognitive.microsoft.com/bing/v5.0/search`
//! - **Authentication**: `Ocp-Apim-Subscription-Key` header, never part of the cache key.
//! - **Paging**: 50 results per page, `offset` counts results.
//! - **Exhaustion**: a page whose mainline ranking holds fewer than 50 slots is the last one.
//! - **Sanity check**: a payload is well-formed when it carries a string `_type`.

pub mod request;
pub mod response;

pub use request::{BingOptions, DEFAULT_MARKET, MAX_RESULTS_PER_QUERY, SafeSearch};
pub use response::BingApiResponse;

use crate::ProviderError;
use crate::fetch::{ApiClient, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use serpcache_core::config::{AppConfig, ConfigError};
use serpcache_core::{Error, PageIdentity, ProviderAdapter, RawPage, ResultEntry};
use std::time::Duration;

/// Default Bing endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.cognitive.microsoft.com/bing/v5.0/search";

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Bing client configuration.
#[derive(Debug, Clone)]
pub struct BingConfig {
    pub api_key: String,
    /// Endpoint; part of every cache key.
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for BingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl BingConfig {
    /// Build from the application configuration; the key must be set.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: config.require_bing_api_key()?.to_string(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            ..Default::default()
        })
    }
}

/// [`ProviderAdapter`] for Bing Web Search.
#[derive(Debug, Clone)]
pub struct BingAdapter {
    client: ApiClient,
    config: BingConfig,
    options: BingOptions,
}

impl BingAdapter {
    pub fn new(config: BingConfig, options: BingOptions) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }
        options.validate()?;

        let client = ApiClient::new(config.timeout, &config.user_agent)?;
        Ok(Self { client, config, options })
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for BingAdapter {
    fn name(&self) -> &str {
        "bing"
    }

    fn page_size(&self) -> usize {
        MAX_RESULTS_PER_QUERY
    }

    fn page_identity(&self, query: &str, offset: usize) -> Result<PageIdentity, Error> {
        let uri = self.options.canonical_uri(&self.config.base_url, query, offset)?;
        Ok(PageIdentity::new(query, offset, uri))
    }

    async fn fetch_page(&self, query: &str, offset: usize) -> Result<RawPage, Error> {
        let identity = self.page_identity(query, offset)?;
        tracing::debug!(offset, "querying Bing");

        let page = self
            .client
            .get_page(identity.as_str(), &[(SUBSCRIPTION_KEY_HEADER, self.config.api_key.as_str())], &[])
            .await?;
        Ok(page)
    }

    fn count_items(&self, page: &RawPage) -> usize {
        page.array_len("/webPages/value")
    }

    fn is_well_formed(&self, page: &RawPage) -> bool {
        page.has_string_field("_type")
    }

    fn is_page_set_complete(&self, pages: &[RawPage], needed_results: usize) -> bool {
        let mut count = 0;
        for page in pages {
            let items = self.count_items(page);
            count += items;
            if count >= needed_results || items == 0 || BingApiResponse::from_page(page).mainline_len() < self.page_size()
            {
                return true;
            }
        }
        false
    }

    fn estimated_total(&self, page: &RawPage) -> i64 {
        BingApiResponse::from_page(page).total_estimated_matches()
    }

    fn entries(&self, page: &RawPage) -> Vec<ResultEntry> {
        BingApiResponse::from_page(page).into_entries()
    }
}
