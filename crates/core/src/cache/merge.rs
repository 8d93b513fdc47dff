//! Bulk merge into a live store and the legacy interchange format.
//!
//! A legacy cache file is a JSON object mapping each canonical request URI to
//! the standard base64 encoding of its compressed payload. Caches built by
//! separate processes are consolidated by exporting one and merging it into
//! another.

use super::blobs::UPSERT_SQL;
use super::connection::CacheDb;
use crate::Error;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::collections::BTreeMap;
use std::path::Path;
use tokio_rusqlite::params;

/// Decoded legacy mapping of key to compressed bytes.
pub type LegacyEntries = BTreeMap<String, Vec<u8>>;

impl CacheDb {
    /// Write every entry into the store, overwriting existing keys, then commit.
    ///
    /// Runs as one transaction on the store's thread. If any write fails the
    /// whole transaction is rolled back, including puts still pending from
    /// other holders of the handle. Applying the same
    /// entries twice leaves the store as applying them once. Returns the
    /// number of entries written.
    pub async fn merge(&self, entries: LegacyEntries) -> Result<usize, Error> {
        let applied = self
            .conn
            .call(move |conn| -> Result<usize, Error> {
                if conn.is_autocommit() {
                    conn.execute_batch("BEGIN IMMEDIATE")?;
                }
                let written = upsert_all(conn, &entries).and_then(|()| conn.execute_batch("COMMIT").map_err(Error::from));
                if let Err(e) = written {
                    if !conn.is_autocommit() {
                        conn.execute_batch("ROLLBACK")?;
                    }
                    return Err(e);
                }
                Ok(entries.len())
            })
            .await
            .map_err(Error::from)?;

        tracing::info!(applied, "merged entries into cache");
        Ok(applied)
    }

    /// Snapshot every committed and pending entry in legacy form.
    pub async fn export(&self) -> Result<LegacyEntries, Error> {
        self.conn
            .call(|conn| -> Result<LegacyEntries, Error> {
                let mut stmt = conn.prepare("SELECT key, value FROM queries")?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)))?
                    .collect::<Result<LegacyEntries, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }
}

fn upsert_all(conn: &tokio_rusqlite::rusqlite::Connection, entries: &LegacyEntries) -> Result<(), Error> {
    let mut stmt = conn.prepare_cached(UPSERT_SQL)?;
    for (key, value) in entries {
        stmt.execute(params![key, value])?;
    }
    Ok(())
}

/// Read a legacy cache file.
pub async fn load_legacy(path: impl AsRef<Path>) -> Result<LegacyEntries, Error> {
    let path = path.as_ref();
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| Error::CacheIo(format!("{}: {e}", path.display())))?;
    let encoded: BTreeMap<String, String> =
        serde_json::from_slice(&raw).map_err(|e| Error::CacheIo(format!("{}: {e}", path.display())))?;

    encoded
        .into_iter()
        .map(|(key, value)| {
            STANDARD
                .decode(value.as_bytes())
                .map(|bytes| (key.clone(), bytes))
                .map_err(|e| Error::CacheIo(format!("bad base64 for {key}: {e}")))
        })
        .collect()
}

/// Write entries as a legacy cache file.
pub async fn save_legacy(path: impl AsRef<Path>, entries: &LegacyEntries) -> Result<(), Error> {
    let path = path.as_ref();
    let encoded: BTreeMap<&str, String> = entries
        .iter()
        .map(|(key, value)| (key.as_str(), STANDARD.encode(value)))
        .collect();
    let json = serde_json::to_vec_pretty(&encoded).map_err(|e| Error::CacheIo(e.to_string()))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| Error::CacheIo(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::compress;
    use proptest::prelude::*;

    fn sample() -> LegacyEntries {
        let mut entries = LegacyEntries::new();
        entries.insert("https://a.example/?q=x&offset=0".into(), compress(r#"{"kind":"a"}"#).unwrap());
        entries.insert("https://a.example/?q=y&offset=0".into(), compress(r#"{"kind":"b"}"#).unwrap());
        entries
    }

    #[tokio::test]
    async fn test_merge_overwrites_conflicts() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("https://a.example/?q=x&offset=0", b"stale").await.unwrap();
        db.put("untouched", b"kept").await.unwrap();
        db.commit().await.unwrap();

        let applied = db.merge(sample()).await.unwrap();
        assert_eq!(applied, 2);
        assert_eq!(db.size().await.unwrap(), 3);

        let merged = db.get("https://a.example/?q=x&offset=0").await.unwrap().unwrap();
        assert_eq!(compress::decompress(&merged).unwrap(), r#"{"kind":"a"}"#);
        assert_eq!(db.get("untouched").await.unwrap().unwrap(), b"kept".to_vec());
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("other", b"1").await.unwrap();
        db.commit().await.unwrap();

        db.merge(sample()).await.unwrap();
        let once = db.export().await.unwrap();
        db.merge(sample()).await.unwrap();
        let twice = db.export().await.unwrap();

        assert_eq!(once, twice);
    }

    /// Makes any upsert of `key` fail mid-transaction.
    async fn reject_key(db: &CacheDb, key: &str) {
        let sql = format!(
            "CREATE TRIGGER reject_key BEFORE INSERT ON queries WHEN NEW.key = '{key}'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;"
        );
        db.conn.call(move |conn| conn.execute_batch(&sql)).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_merge_leaves_nothing_pending() {
        let db = CacheDb::open_in_memory().await.unwrap();
        reject_key(&db, "https://a.example/?q=y&offset=0").await;

        let result = db.merge(sample()).await;
        assert!(matches!(result, Err(Error::Database(_))));

        db.commit().await.unwrap();
        assert_eq!(db.size().await.unwrap(), 0);
        assert!(!db.has("https://a.example/?q=x&offset=0").await.unwrap());
    }

    fn entries_strategy() -> impl Strategy<Value = LegacyEntries> {
        prop::collection::btree_map("[a-z]{1,6}", prop::collection::vec(any::<u8>(), 0..32), 0..12)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_merge_twice_equals_merge_once(existing in entries_strategy(), incoming in entries_strategy()) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let (once, twice) = runtime.block_on(async {
                let db = CacheDb::open_in_memory().await.unwrap();
                for (key, value) in &existing {
                    db.put(key, value).await.unwrap();
                }
                db.commit().await.unwrap();

                db.merge(incoming.clone()).await.unwrap();
                let once = db.export().await.unwrap();
                db.merge(incoming.clone()).await.unwrap();
                let twice = db.export().await.unwrap();
                (once, twice)
            });

            let mut expected = existing.clone();
            expected.extend(incoming.clone());
            prop_assert_eq!(&once, &expected);
            prop_assert_eq!(once, twice);
        }
    }

    #[tokio::test]
    async fn test_merge_commits_pending_puts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");

        let db = CacheDb::open(&path).await.unwrap();
        db.merge(sample()).await.unwrap();
        db.close().await.unwrap();

        let reopened = CacheDb::open(&path).await.unwrap();
        assert_eq!(reopened.size().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_legacy_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("legacy.json");

        save_legacy(&file, &sample()).await.unwrap();
        let loaded = load_legacy(&file).await.unwrap();
        assert_eq!(loaded, sample());
    }

    #[tokio::test]
    async fn test_load_legacy_rejects_bad_base64() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("legacy.json");
        tokio::fs::write(&file, r#"{"k":"%%%not base64"}"#).await.unwrap();

        let result = load_legacy(&file).await;
        assert!(matches!(result, Err(Error::CacheIo(msg)) if msg.contains("k")));
    }

    #[tokio::test]
    async fn test_load_legacy_missing_file() {
        let result = load_legacy("/definitely/not/here.json").await;
        assert!(matches!(result, Err(Error::CacheIo(_))));
    }
}
