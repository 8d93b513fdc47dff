//! Cache-first pagination over a provider.
//!
//! A query first walks its pages through the cache. Only if every page up to
//! completion is cached is the answer served from there; a single miss
//! discards the walk and re-fetches the whole query live. Live passes that
//! return malformed pages are retried after a fixed delay, and only pages from
//! a well-formed pass are written back.

use super::model::{AggregatedResponse, PageIdentity, RawPage};
use super::provider::ProviderAdapter;
use super::retry::RetryPolicy;
use crate::Error;
use crate::cache::{CacheDb, compress, decompress};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Hard ceiling on pages per walk, whatever the adapter's completeness says.
pub const MAX_PAGES_PER_QUERY: usize = 100;

/// Serialised, cache-backed front-end for one provider.
///
/// Every `query` call holds the instance lock for its whole duration,
/// including retry sleeps, so concurrent callers on one instance run one at a
/// time. Several aggregators may share a single [`CacheDb`].
pub struct PaginatingCacheAggregator {
    adapter: Arc<dyn ProviderAdapter>,
    cache: CacheDb,
    retry: RetryPolicy,
    lock: Mutex<()>,
}

/// Pages gathered by one walk, identities aligned with pages.
struct Walk {
    identities: Vec<PageIdentity>,
    pages: Vec<RawPage>,
}

impl PaginatingCacheAggregator {
    pub fn new(adapter: Arc<dyn ProviderAdapter>, cache: CacheDb) -> Self {
        Self { adapter, cache, retry: RetryPolicy::default(), lock: Mutex::new(()) }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn adapter(&self) -> &dyn ProviderAdapter {
        self.adapter.as_ref()
    }

    pub fn cache(&self) -> &CacheDb {
        &self.cache
    }

    /// Return up to `needed_results` entries for `query`.
    ///
    /// Served from the cache with no network access when every page is cached.
    /// Transport, argument and cache errors are returned as-is. A malformed
    /// result is never an error: once retries run out the last pass is
    /// returned uncached, with `attempts` equal to the policy's maximum.
    pub async fn query(&self, query: &str, needed_results: usize) -> Result<AggregatedResponse, Error> {
        let _guard = self.lock.lock().await;

        if let Some(walk) = self.walk_cache(query, needed_results).await? {
            for identity in &walk.identities {
                tracing::debug!(provider = self.adapter.name(), "<cached> {}", identity);
            }
            let mut response = self.adapter.assemble_response(walk.identities, walk.pages, needed_results);
            response.from_cache = true;
            return Ok(response);
        }

        self.fetch_live(query, needed_results).await
    }

    /// Walk cached pages from offset 0. None on the first missing page.
    async fn walk_cache(&self, query: &str, needed_results: usize) -> Result<Option<Walk>, Error> {
        let mut walk = Walk { identities: Vec::new(), pages: Vec::new() };
        let mut offset = 0;

        loop {
            let identity = self.adapter.page_identity(query, offset)?;
            let Some(blob) = self.cache.get(identity.as_str()).await? else {
                tracing::debug!(provider = self.adapter.name(), offset, "cache miss, switching to live fetch");
                return Ok(None);
            };
            let page = RawPage::from_json_str(&decompress(&blob)?)?;
            let items = self.adapter.count_items(&page);
            walk.identities.push(identity);
            walk.pages.push(page);

            if self.walk_finished(&walk.pages, items, needed_results) {
                return Ok(Some(walk));
            }
            offset += items;
        }
    }

    /// Fetch the whole query live, retrying malformed passes.
    async fn fetch_live(&self, query: &str, needed_results: usize) -> Result<AggregatedResponse, Error> {
        let mut attempt = 1;
        loop {
            let walk = self.fetch_pages(query, needed_results).await?;
            let malformed = walk.pages.iter().filter(|page| !self.adapter.is_well_formed(page)).count();

            if malformed == 0 {
                if let Err(e) = self.persist(&walk).await {
                    self.cache.rollback().await?;
                    return Err(e);
                }
                let mut response = self.adapter.assemble_response(walk.identities, walk.pages, needed_results);
                response.attempts = attempt;
                return Ok(response);
            }

            let err = Error::MalformedResponse(format!(
                "{malformed} of {} pages failed the {} sanity check",
                walk.pages.len(),
                self.adapter.name()
            ));

            if !self.retry.should_retry(attempt) {
                tracing::warn!(
                    provider = self.adapter.name(),
                    attempts = attempt,
                    error = %err,
                    "bad responses after all attempts, returning them uncached"
                );
                let mut response = self.adapter.assemble_response(walk.identities, walk.pages, needed_results);
                response.attempts = attempt;
                return Ok(response);
            }

            attempt += 1;
            tracing::warn!(
                provider = self.adapter.name(),
                error = %err,
                next_attempt = attempt,
                "bad responses, calling provider again"
            );
            tokio::time::sleep(self.retry.delay_before(attempt)).await;
        }
    }

    /// One live pass over the query's pages, from offset 0.
    async fn fetch_pages(&self, query: &str, needed_results: usize) -> Result<Walk, Error> {
        let mut walk = Walk { identities: Vec::new(), pages: Vec::new() };
        let mut offset = 0;

        loop {
            let identity = self.adapter.page_identity(query, offset)?;
            tracing::info!(provider = self.adapter.name(), "<querying> {}", identity);
            let page = self.adapter.fetch_page(query, offset).await?;
            let items = self.adapter.count_items(&page);
            walk.identities.push(identity);
            walk.pages.push(page);

            if self.walk_finished(&walk.pages, items, needed_results) {
                return Ok(walk);
            }
            offset += items;
        }
    }

    /// An empty page ends a walk even if the adapter disagrees, so offsets
    /// always advance.
    fn walk_finished(&self, pages: &[RawPage], last_items: usize, needed_results: usize) -> bool {
        last_items == 0
            || pages.len() >= MAX_PAGES_PER_QUERY
            || self.adapter.is_page_set_complete(pages, needed_results)
    }

    /// Store every page of a well-formed pass, then commit once.
    ///
    /// On failure the caller rolls back, so no half-written pass is left
    /// for a later commit to make durable.
    async fn persist(&self, walk: &Walk) -> Result<(), Error> {
        for (identity, page) in walk.identities.iter().zip(&walk.pages) {
            let blob = compress(&page.to_json_string())?;
            self.cache.put(identity.as_str(), &blob).await?;
        }
        self.cache.commit().await?;
        tracing::debug!(provider = self.adapter.name(), pages = walk.pages.len(), "cached fetched pages");
        Ok(())
    }
}
