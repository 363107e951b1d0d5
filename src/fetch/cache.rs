//! Freshness cache for fetched tables, keyed by source URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, error, warn};

use crate::process::RawTable;

pub trait TableCache {
    /// A fresh table for `key`, or `None` when absent or expired.
    fn get(&self, key: &str) -> Option<RawTable>;
    /// Store `table` under `key` for `ttl`. Failures are logged, not returned.
    fn put(&self, key: &str, table: &RawTable, ttl: Duration);
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    key: String,
    expires_at: DateTime<Utc>,
    table: RawTable,
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl TableCache for DiskCache {
    fn get(&self, key: &str) -> Option<RawTable> {
        let path = self.entry_path(key);
        let text = fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&text) {
            Ok(e) => e,
            Err(e) => {
                warn!("ignoring corrupt cache entry {:?}: {}", path, e);
                return None;
            }
        };
        if entry.key != key {
            debug!(key, stored = %entry.key, "cache file belongs to another key");
            return None;
        }
        if entry.expires_at <= Utc::now() {
            debug!(key, expired = %entry.expires_at, "cache entry expired");
            return None;
        }
        Some(entry.table)
    }

    fn put(&self, key: &str, table: &RawTable, ttl: Duration) {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());
        let entry = CacheEntry {
            key: key.to_string(),
            expires_at: Utc::now() + ttl,
            table: table.clone(),
        };
        let path = self.entry_path(key);
        let written = serde_json::to_string(&entry)
            .map_err(std::io::Error::from)
            .and_then(|json| fs::write(&path, json));
        match written {
            Ok(()) => debug!(key, path = %path.display(), "cached table"),
            Err(e) => error!("failed to write cache entry {:?}: {}", path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table() -> RawTable {
        RawTable::new(
            vec!["Papel".into(), "P/L".into()],
            vec![vec!["PETR4".into(), "5,2".into()]],
            "https://example.test/resultado.php",
        )
    }

    #[test]
    fn put_then_get_while_fresh() {
        let tmp = tempdir().unwrap();
        let cache = DiskCache::new(tmp.path()).unwrap();
        let key = "https://example.test/resultado.php";

        assert!(cache.get(key).is_none());
        cache.put(key, &table(), Duration::from_secs(60));
        let cached = cache.get(key).expect("fresh entry");
        assert_eq!(cached.headers, table().headers);
        assert_eq!(cached.rows, table().rows);
        assert!(cache.get("https://example.test/other.php").is_none());
    }

    #[test]
    fn expired_entries_are_absent() {
        let tmp = tempdir().unwrap();
        let cache = DiskCache::new(tmp.path()).unwrap();
        cache.put("k", &table(), Duration::ZERO);
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn corrupt_entries_are_absent() {
        let tmp = tempdir().unwrap();
        let cache = DiskCache::new(tmp.path()).unwrap();
        fs::write(cache.entry_path("k"), "{not json").unwrap();
        assert!(cache.get("k").is_none());
    }
}
