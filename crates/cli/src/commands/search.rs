//! Provider query commands.

use super::cache::open;
use anyhow::{Context, Result};
use serpcache_client::{
    BingAdapter, BingConfig, BingOptions, GoogleAdapter, GoogleConfig, GoogleOptions, GoogleSafeSearch, SafeSearch,
};
use serpcache_core::search::{SNIPPET_BOLD_END, SNIPPET_BOLD_START};
use serpcache_core::{AggregatedResponse, AppConfig, PaginatingCacheAggregator, ProviderAdapter};
use std::sync::Arc;

pub async fn bing(
    config: &AppConfig, query: &str, results: usize, market: Option<String>, safe_search: SafeSearch,
) -> Result<()> {
    let options = BingOptions {
        market: market.unwrap_or_else(|| config.market.clone()),
        safe_search,
        ..Default::default()
    };
    let adapter = BingAdapter::new(BingConfig::from_app_config(config)?, options).context("invalid Bing setup")?;
    run(config, Arc::new(adapter), query, results).await
}

pub async fn google(
    config: &AppConfig, query: &str, results: usize, geolocation: Option<String>, safe_search: GoogleSafeSearch,
) -> Result<()> {
    let options = GoogleOptions { geolocation: geolocation.unwrap_or_else(|| config.geolocation.clone()), safe_search };
    let adapter =
        GoogleAdapter::new(GoogleConfig::from_app_config(config)?, options).context("invalid Google setup")?;
    run(config, Arc::new(adapter), query, results).await
}

async fn run(config: &AppConfig, adapter: Arc<dyn ProviderAdapter>, query: &str, results: usize) -> Result<()> {
    let db = open(config).await?;
    let aggregator = PaginatingCacheAggregator::new(adapter, db.clone()).with_retry_policy(config.retry_policy());

    let outcome = aggregator.query(query, results).await;
    let response = match outcome {
        Ok(response) => response,
        Err(e) if e.is_cache_fatal() => {
            return Err(anyhow::Error::new(e)
                .context(format!("cache {} is unusable, try `serpcache repair`", config.db_path.display())));
        }
        Err(e) => return Err(e.into()),
    };
    db.close().await?;

    if !response.from_cache && response.attempts >= config.max_attempts {
        let malformed = response.raw_pages.iter().any(|page| !aggregator.adapter().is_well_formed(page));
        if malformed {
            tracing::warn!(attempts = response.attempts, "provider kept returning bad responses; results not cached");
        }
    }

    print_response(&response);
    Ok(())
}

fn print_response(response: &AggregatedResponse) {
    println!("Estimated result count: {}", response.estimated_total_matches);
    for (i, entry) in response.entries.iter().enumerate() {
        println!();
        println!("{}. {}", i + 1, entry.title);
        println!("   {}", entry.display_url);
        println!("   {}", plain(&entry.snippet));
        if let Some(crawled) = entry.last_crawled {
            println!("   Crawled on {}", crawled.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }
}

/// Drop highlight markers for terminal output.
fn plain(snippet: &str) -> String {
    snippet.replace([SNIPPET_BOLD_START, SNIPPET_BOLD_END], "")
}
