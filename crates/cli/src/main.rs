//! `serpcache` command-line entry point.

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use serpcache_core::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = AppConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    tracing::debug!(db = %config.db_path.display(), "configuration loaded");

    match cli.command {
        Commands::Stats => commands::cache::stats(&config).await,
        Commands::Repair => commands::cache::repair(&config).await,
        Commands::Merge { file } => commands::cache::merge(&config, &file).await,
        Commands::Export { file } => commands::cache::export(&config, &file).await,
        Commands::Bing { query, results, market, safe_search } => {
            commands::search::bing(&config, &query, results, market, safe_search).await
        }
        Commands::Google { query, results, geolocation, safe_search } => {
            commands::search::google(&config, &query, results, geolocation, safe_search).await
        }
    }
}

/// Logs go to stderr; stdout carries results only.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
