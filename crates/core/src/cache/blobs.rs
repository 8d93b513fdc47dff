//! Blob operations on the `queries` table.
//!
//! Values are stored exactly as given; the aggregator is responsible for
//! compressing before `put` and decompressing after `get`.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;

/// Upsert used by `put` and by bulk merges. Last writer wins on a key.
pub(crate) const UPSERT_SQL: &str = "INSERT INTO queries (key, value) VALUES (?1, ?2)
    ON CONFLICT(key) DO UPDATE SET value = excluded.value";

/// Default number of keys fetched per cursor batch.
pub const DEFAULT_KEY_BATCH: usize = 512;

impl CacheDb {
    /// Check whether a key is present.
    pub async fn has(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let present: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM queries WHERE key = ?1)",
                    params![key],
                    |row| row.get(0),
                )?;
                Ok(present)
            })
            .await
            .map_err(Error::from)
    }

    /// Get the stored bytes for a key.
    ///
    /// Returns None if the key doesn't exist in the cache.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Vec<u8>>, Error> {
                let mut stmt = conn.prepare_cached("SELECT value FROM queries WHERE key = ?1")?;

                match stmt.query_row(params![key], |row| row.get(0)) {
                    Ok(value) => Ok(Some(value)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or overwrite the bytes stored for a key.
    ///
    /// The write joins the pending transaction (opening one if needed) and only
    /// becomes durable at the next [`CacheDb::commit`].
    pub async fn put(&self, key: &str, value: &[u8]) -> Result<(), Error> {
        let key = key.to_string();
        let value = value.to_vec();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                if conn.is_autocommit() {
                    conn.execute_batch("BEGIN IMMEDIATE")?;
                }
                conn.execute(UPSERT_SQL, params![key, value])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Number of stored entries.
    pub async fn size(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM queries", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Up to `limit` keys strictly greater than `after`, in key order.
    pub async fn keys_after(&self, after: Option<&str>, limit: usize) -> Result<Vec<String>, Error> {
        let after = after.map(str::to_string);
        let limit = limit as i64;
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare_cached(
                    "SELECT key FROM queries WHERE (?1 IS NULL OR key > ?1) ORDER BY key LIMIT ?2",
                )?;
                let keys = stmt
                    .query_map(params![after, limit], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// Every stored key, in key order.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        let mut cursor = self.key_cursor(DEFAULT_KEY_BATCH);
        let mut all = Vec::new();
        while let Some(batch) = cursor.next_batch().await? {
            all.extend(batch);
        }
        Ok(all)
    }

    /// Lazy key enumeration in batches of `batch` keys.
    ///
    /// Each cursor starts from the smallest key, so a fresh cursor restarts the walk.
    pub fn key_cursor(&self, batch: usize) -> KeyCursor {
        KeyCursor { db: self.clone(), last: None, batch: batch.max(1), done: false }
    }
}

/// Keyset-paginated walk over the stored keys.
#[derive(Debug, Clone)]
pub struct KeyCursor {
    db: CacheDb,
    last: Option<String>,
    batch: usize,
    done: bool,
}

impl KeyCursor {
    /// Next batch of keys, or None once every key has been returned.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<String>>, Error> {
        if self.done {
            return Ok(None);
        }
        let keys = self.db.keys_after(self.last.as_deref(), self.batch).await?;
        if keys.len() < self.batch {
            self.done = true;
        }
        if keys.is_empty() {
            return Ok(None);
        }
        self.last = keys.last().cloned();
        Ok(Some(keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("https://api.example/search?q=a&offset=0", b"payload").await.unwrap();
        db.commit().await.unwrap();

        let value = db.get("https://api.example/search?q=a&offset=0").await.unwrap();
        assert_eq!(value.as_deref(), Some(&b"payload"[..]));
        assert!(db.has("https://api.example/search?q=a&offset=0").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.get("nonexistent").await.unwrap().is_none());
        assert!(!db.has("nonexistent").await.unwrap());
    }

    #[tokio::test]
    async fn test_uncommitted_put_visible_to_same_handle() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("k", b"v").await.unwrap();
        assert!(db.has("k").await.unwrap());
        assert_eq!(db.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("k", b"old").await.unwrap();
        db.put("k", b"new").await.unwrap();
        db.commit().await.unwrap();

        assert_eq!(db.get("k").await.unwrap().unwrap(), b"new".to_vec());
        assert_eq!(db.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_uncommitted_put_lost_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");

        let db = CacheDb::open(&path).await.unwrap();
        db.put("durable", b"1").await.unwrap();
        db.commit().await.unwrap();
        db.put("pending", b"2").await.unwrap();
        db.close().await.unwrap();

        let reopened = CacheDb::open(&path).await.unwrap();
        assert!(reopened.has("durable").await.unwrap());
        assert!(!reopened.has("pending").await.unwrap());
    }

    #[tokio::test]
    async fn test_key_cursor_batches_and_restarts() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for key in ["c", "a", "e", "b", "d"] {
            db.put(key, key.as_bytes()).await.unwrap();
        }
        db.commit().await.unwrap();

        let mut cursor = db.key_cursor(2);
        let mut batches = Vec::new();
        while let Some(batch) = cursor.next_batch().await.unwrap() {
            batches.push(batch);
        }
        assert_eq!(batches, vec![vec!["a", "b"], vec!["c", "d"], vec!["e"]]);
        assert!(cursor.next_batch().await.unwrap().is_none());

        let mut fresh = db.key_cursor(10);
        assert_eq!(fresh.next_batch().await.unwrap().unwrap().len(), 5);
        assert_eq!(db.keys().await.unwrap(), vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_empty_cache_enumeration() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert_eq!(db.size().await.unwrap(), 0);
        assert!(db.keys().await.unwrap().is_empty());
        assert!(db.key_cursor(4).next_batch().await.unwrap().is_none());
    }
}
