//! Paginated, cache-backed search over pluggable providers.

pub mod aggregator;
pub mod model;
pub mod provider;
pub mod retry;

#[cfg(test)]
pub(crate) mod mock;

pub use aggregator::{MAX_PAGES_PER_QUERY, PaginatingCacheAggregator};
pub use model::{AggregatedResponse, PageIdentity, RawPage, ResultEntry, SNIPPET_BOLD_END, SNIPPET_BOLD_START};
pub use provider::ProviderAdapter;
pub use retry::RetryPolicy;
