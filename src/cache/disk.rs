use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CacheEntry;
use crate::report::BatchReport;

const KEY_PREFIX: &str = "batch:";

/// What lands on disk for one key
#[derive(Serialize)]
struct StoredEntryRef<'a> {
    computed_at: DateTime<Utc>,
    payload: &'a BatchReport,
}

#[derive(Deserialize)]
struct StoredEntry {
    computed_at: DateTime<Utc>,
    payload: BatchReport,
}

/// Best-effort persisted layer backed by cacache.
///
/// Nothing here returns an error: a failed read is a miss and a failed write
/// is forgotten, both logged at debug.
#[derive(Debug, Clone)]
pub struct DiskStore {
    cache_path: PathBuf,
}

impl DiskStore {
    pub fn new(cache_path: PathBuf) -> Self {
        Self { cache_path }
    }

    fn disk_key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }

    pub fn read(&self, key: &str) -> Option<CacheEntry> {
        let bytes = match cacache::read_sync(&self.cache_path, Self::disk_key(key)) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(key, error = %e, "persisted cache miss");
                return None;
            }
        };
        match serde_json::from_slice::<StoredEntry>(&bytes) {
            Ok(stored) => Some(CacheEntry {
                payload: Arc::new(stored.payload),
                computed_at: stored.computed_at,
            }),
            Err(e) => {
                tracing::debug!(key, error = %e, "unreadable persisted cache entry");
                None
            }
        }
    }

    pub fn write(&self, key: &str, entry: &CacheEntry) {
        let stored = StoredEntryRef {
            computed_at: entry.computed_at,
            payload: &entry.payload,
        };
        let bytes = match serde_json::to_vec(&stored) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(key, error = %e, "failed to serialize cache entry");
                return;
            }
        };
        if let Err(e) = cacache::write_sync(&self.cache_path, Self::disk_key(key), &bytes) {
            tracing::debug!(key, error = %e, "failed to persist cache entry");
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = cacache::remove_sync(&self.cache_path, Self::disk_key(key)) {
            tracing::debug!(key, error = %e, "failed to remove persisted cache entry");
        }
    }
}
