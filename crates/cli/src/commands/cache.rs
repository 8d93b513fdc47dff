//! Cache maintenance commands.

use anyhow::{Context, Result};
use serpcache_core::cache::{DEFAULT_KEY_BATCH, load_legacy, save_legacy};
use serpcache_core::{AppConfig, CacheDb};
use std::path::Path;

/// Print every cached URI, then the total.
pub async fn stats(config: &AppConfig) -> Result<()> {
    let db = open(config).await?;

    println!("List of cached URIs:");
    let mut cursor = db.key_cursor(DEFAULT_KEY_BATCH);
    while let Some(keys) = cursor.next_batch().await? {
        for key in keys {
            println!("{key}");
        }
    }
    println!("Total cached URIs: {}", db.size().await?);

    db.close().await?;
    Ok(())
}

/// Bypass-open the file, report its integrity, then reopen it normally.
pub async fn repair(config: &AppConfig) -> Result<()> {
    let path = &config.db_path;
    let bypass = CacheDb::open_bypass(path)
        .await
        .with_context(|| format!("failed to open {} in bypass mode", path.display()))?;
    let report = bypass.repair_report().await?;
    bypass.close().await?;

    println!("Integrity check:");
    for line in &report {
        println!("  {line}");
    }

    let db = open(config).await?;
    println!("Total cached URIs: {}", db.size().await?);
    db.close().await?;
    Ok(())
}

/// Merge a legacy cache file into the store.
pub async fn merge(config: &AppConfig, file: &Path) -> Result<()> {
    let entries = load_legacy(file).await?;
    tracing::info!(entries = entries.len(), file = %file.display(), "loaded legacy cache");

    let db = open(config).await?;
    let applied = db.merge(entries).await?;
    println!("Merged {applied} entries; total cached URIs: {}", db.size().await?);
    db.close().await?;
    Ok(())
}

/// Write the store as a legacy cache file.
pub async fn export(config: &AppConfig, file: &Path) -> Result<()> {
    let db = open(config).await?;
    let entries = db.export().await?;
    db.close().await?;

    save_legacy(file, &entries).await?;
    println!("Exported {} entries to {}", entries.len(), file.display());
    Ok(())
}

pub(crate) async fn open(config: &AppConfig) -> Result<CacheDb> {
    CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open cache {}", config.db_path.display()))
}
