//! Contract every search provider adapter satisfies.

use super::model::{AggregatedResponse, PageIdentity, RawPage, ResultEntry};
use crate::Error;

/// A paginated search provider as seen by the aggregator.
///
/// The aggregator never looks inside a [`RawPage`]; everything it needs to know
/// about a payload comes through these methods. Offsets count results already
/// returned for the query, not pages.
#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &str;

    /// Results the provider returns for a full page; anything shorter is the last page.
    fn page_size(&self) -> usize;

    /// Canonical identity of the call for `query` at `offset`.
    ///
    /// Pure and deterministic; must not perform I/O. Must embed enough of the
    /// provider's endpoint to keep keys from different providers apart.
    fn page_identity(&self, query: &str, offset: usize) -> Result<PageIdentity, Error>;

    /// Call the provider for one page. Non-success statuses and connectivity
    /// failures are [`Error::Transport`].
    async fn fetch_page(&self, query: &str, offset: usize) -> Result<RawPage, Error>;

    /// Number of results carried by a page.
    fn count_items(&self, page: &RawPage) -> usize;

    /// Coarse structural sanity check of a payload.
    fn is_well_formed(&self, page: &RawPage) -> bool;

    /// Whether `pages` (in offset order) hold enough results or exhaust the provider.
    ///
    /// By default a page shorter than [`page_size`](Self::page_size), an empty
    /// page included, marks exhaustion.
    fn is_page_set_complete(&self, pages: &[RawPage], needed_results: usize) -> bool {
        let mut count = 0;
        for page in pages {
            let items = self.count_items(page);
            count += items;
            if count >= needed_results || items < self.page_size() {
                return true;
            }
        }
        false
    }

    /// Provider-reported total match count carried by a page.
    fn estimated_total(&self, page: &RawPage) -> i64;

    /// Results of one page in provider order.
    fn entries(&self, page: &RawPage) -> Vec<ResultEntry>;

    /// Merge pages in order, truncated to `needed_results`; the total comes
    /// from the first page.
    fn assemble_response(
        &self, identities: Vec<PageIdentity>, pages: Vec<RawPage>, needed_results: usize,
    ) -> AggregatedResponse {
        let total = pages.first().map_or(0, |page| self.estimated_total(page));
        let page_entries: Vec<Vec<ResultEntry>> = pages.iter().map(|page| self.entries(page)).collect();
        AggregatedResponse::assemble(total, identities, pages, page_entries, needed_results)
    }
}
