//! Command-line interface definition for `serpcache`.
//!
//! ```bash
//! serpcache stats
//! serpcache repair
//! serpcache merge old-cache.json
//! serpcache bing "rust async" -n 120 --market it-IT
//! serpcache google "rust async" -n 25 --geolocation it
//! ```

use clap::{Parser, Subcommand};
use serpcache_client::{GoogleSafeSearch, SafeSearch};
use std::path::PathBuf;

/// Cache-first search over Bing and Google with a shared SQLite page cache.
#[derive(Parser, Debug)]
#[command(name = "serpcache", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML configuration file
    #[arg(long, global = true, env = "SERPCACHE_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Cache file, overriding the configured `db_path`
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every cached request URI and the total count
    Stats,

    /// Check the cache file and reopen it normally
    Repair,

    /// Merge a legacy JSON cache file into the store
    Merge {
        /// Legacy file (JSON object of URI to base64 payload)
        file: PathBuf,
    },

    /// Write the store as a legacy JSON cache file
    Export {
        /// Destination file
        file: PathBuf,
    },

    /// Query Bing Web Search through the cache
    Bing {
        /// Search query
        query: String,

        /// Number of results wanted
        #[arg(short = 'n', long, default_value_t = 10)]
        results: usize,

        /// Market, e.g. en-US (defaults to the configured market)
        #[arg(long)]
        market: Option<String>,

        /// off, moderate or strict
        #[arg(long, default_value = "off")]
        safe_search: SafeSearch,
    },

    /// Query Google Custom Search through the cache
    Google {
        /// Search query
        query: String,

        /// Number of results wanted
        #[arg(short = 'n', long, default_value_t = 10)]
        results: usize,

        /// Country code, e.g. us (defaults to the configured geolocation)
        #[arg(long)]
        geolocation: Option<String>,

        /// off, medium or high
        #[arg(long, default_value = "off")]
        safe_search: GoogleSafeSearch,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bing_with_globals() {
        let cli = Cli::try_parse_from([
            "serpcache", "--db", "/tmp/c.sqlite", "bing", "rust", "-n", "120", "--safe-search", "strict",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/c.sqlite")));
        match cli.command {
            Commands::Bing { query, results, market, safe_search } => {
                assert_eq!(query, "rust");
                assert_eq!(results, 120);
                assert!(market.is_none());
                assert_eq!(safe_search, SafeSearch::Strict);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_google_defaults() {
        let cli = Cli::try_parse_from(["serpcache", "google", "rust", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Google { results, safe_search, .. } => {
                assert_eq!(results, 10);
                assert_eq!(safe_search, GoogleSafeSearch::Off);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_bad_safe_search_rejected() {
        assert!(Cli::try_parse_from(["serpcache", "google", "rust", "--safe-search", "strict"]).is_err());
    }
}
