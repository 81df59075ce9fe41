//! Result cache for computed batches.
//!
//! An in-memory map of `Arc<BatchReport>` keyed by request identity (usually a
//! date), backed by an optional cacache store so a cold process can serve the
//! last computed batch without going back to the network.

mod clock;
mod disk;

pub use clock::{Clock, SystemClock};
pub use disk::DiskStore;

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::report::BatchReport;

pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_STALE_TTL: Duration = Duration::from_secs(60 * 60);

/// Configuration for result caching
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub enabled: bool, // false when --no-cache
    pub path: PathBuf,
    /// How long an entry is served without recomputing
    pub ttl: Duration,
    /// How long an entry may still be served when recomputation fails
    pub stale_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: get_cache_path(),
            ttl: DEFAULT_TTL,
            stale_ttl: DEFAULT_STALE_TTL,
        }
    }
}

/// Get the platform-appropriate cache directory for race-ranker
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("race-ranker/results"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/race-ranker/results",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Remove the persisted cache directory
pub fn clear_cache(path: &std::path::Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Arc<BatchReport>,
    pub computed_at: DateTime<Utc>,
}

/// Where a returned batch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// In-memory entry within its TTL
    Fresh,
    /// Loaded from disk into a cold memory cache
    Persisted,
    /// Freshly computed and stored
    Computed,
    /// Recompute failed; an older entry within the stale window was served
    Stale,
}

pub struct ResultCache<C: Clock = SystemClock> {
    entries: RwLock<HashMap<String, CacheEntry>>,
    disk: Option<DiskStore>,
    ttl: Duration,
    stale_ttl: Duration,
    clock: C,
}

impl ResultCache<SystemClock> {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> ResultCache<C> {
    pub fn with_clock(config: &CacheConfig, clock: C) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            disk: config.enabled.then(|| DiskStore::new(config.path.clone())),
            ttl: config.ttl,
            stale_ttl: config.stale_ttl,
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Return a cached batch for `key`, computing it when nothing fresh is
    /// available.
    ///
    /// A failed computation falls back to the newest entry still inside the
    /// stale window; only when there is none does the error propagate.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> Result<(Arc<BatchReport>, CacheStatus)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<BatchReport>>,
    {
        let now = self.clock.now();

        if let Some(entry) = self.memory_entry(key) {
            if age_within(&entry, now, self.ttl) {
                tracing::debug!(key, "cache hit");
                return Ok((entry.payload, CacheStatus::Fresh));
            }
        }

        let persisted = self.disk.as_ref().and_then(|disk| disk.read(key));
        if let Some(entry) = &persisted {
            if age_within(entry, now, self.ttl) {
                tracing::debug!(key, "warming memory from persisted cache");
                self.store_memory(key, entry.clone());
                return Ok((entry.payload.clone(), CacheStatus::Persisted));
            }
        }

        match compute().await {
            Ok(batch) => {
                let entry = CacheEntry {
                    payload: Arc::new(batch),
                    computed_at: self.clock.now(),
                };
                self.store_memory(key, entry.clone());
                if let Some(disk) = &self.disk {
                    disk.write(key, &entry);
                }
                Ok((entry.payload, CacheStatus::Computed))
            }
            Err(e) => {
                let now = self.clock.now();
                let fallback = [self.memory_entry(key), persisted]
                    .into_iter()
                    .flatten()
                    .filter(|entry| age_within(entry, now, self.stale_ttl))
                    .max_by_key(|entry| entry.computed_at);
                match fallback {
                    Some(entry) => {
                        tracing::warn!(key, computed_at = %entry.computed_at, error = %format!("{:#}", e), "recompute failed, serving stale batch");
                        Ok((entry.payload, CacheStatus::Stale))
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// Drop `key` from memory and disk.
    pub fn invalidate(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
        if let Some(disk) = &self.disk {
            disk.remove(key);
        }
    }

    /// Clear the in-memory cache; persisted entries survive
    pub fn clear_memory(&self) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    fn memory_entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    fn store_memory(&self, key: &str, entry: CacheEntry) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), entry);
    }
}

/// Entries stamped in the future count as brand new.
fn age_within(entry: &CacheEntry, now: DateTime<Utc>, limit: Duration) -> bool {
    match (now - entry.computed_at).to_std() {
        Ok(age) => age < limit,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                now: Mutex::new(Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()),
            }
        }

        fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += chrono::Duration::from_std(by).unwrap();
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn minutes(m: u64) -> Duration {
        Duration::from_secs(m * 60)
    }

    fn memory_only() -> CacheConfig {
        CacheConfig {
            enabled: false,
            path: PathBuf::new(),
            ttl: DEFAULT_TTL,
            stale_ttl: DEFAULT_STALE_TTL,
        }
    }

    fn on_disk(dir: &tempfile::TempDir) -> CacheConfig {
        CacheConfig {
            enabled: true,
            path: dir.path().to_path_buf(),
            ttl: DEFAULT_TTL,
            stale_ttl: DEFAULT_STALE_TTL,
        }
    }

    fn batch(key: &str) -> BatchReport {
        BatchReport::new(key, Utc::now(), vec![])
    }

    async fn compute_counted(calls: &AtomicUsize, key: &str) -> Result<BatchReport> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(batch(key))
    }

    async fn compute_failing() -> Result<BatchReport> {
        anyhow::bail!("upstream unavailable")
    }

    #[tokio::test]
    async fn test_fresh_entry_returned_without_recompute() {
        let cache = ResultCache::with_clock(&memory_only(), ManualClock::new());
        let calls = AtomicUsize::new(0);

        let (first, status) = cache.get_or_compute("d", || compute_counted(&calls, "d")).await.unwrap();
        assert_eq!(status, CacheStatus::Computed);

        cache.clock().advance(minutes(5));
        let (second, status) = cache.get_or_compute("d", || compute_counted(&calls, "d")).await.unwrap();
        assert_eq!(status, CacheStatus::Fresh);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_recomputed() {
        let cache = ResultCache::with_clock(&memory_only(), ManualClock::new());
        let calls = AtomicUsize::new(0);

        let (first, _) = cache.get_or_compute("d", || compute_counted(&calls, "d")).await.unwrap();
        cache.clock().advance(minutes(11));
        let (second, status) = cache.get_or_compute("d", || compute_counted(&calls, "d")).await.unwrap();

        assert_eq!(status, CacheStatus::Computed);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = ResultCache::with_clock(&memory_only(), ManualClock::new());
        let calls = AtomicUsize::new(0);

        cache.get_or_compute("a", || compute_counted(&calls, "a")).await.unwrap();
        let (b, status) = cache.get_or_compute("b", || compute_counted(&calls, "b")).await.unwrap();
        assert_eq!(status, CacheStatus::Computed);
        assert_eq!(b.key, "b");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stale_served_when_recompute_fails() {
        let cache = ResultCache::with_clock(&memory_only(), ManualClock::new());
        let calls = AtomicUsize::new(0);

        let (first, _) = cache.get_or_compute("d", || compute_counted(&calls, "d")).await.unwrap();
        cache.clock().advance(minutes(20));
        let (served, status) = cache.get_or_compute("d", compute_failing).await.unwrap();

        assert_eq!(status, CacheStatus::Stale);
        assert!(Arc::ptr_eq(&first, &served));
    }

    #[tokio::test]
    async fn test_error_propagates_past_stale_window() {
        let cache = ResultCache::with_clock(&memory_only(), ManualClock::new());
        let calls = AtomicUsize::new(0);

        cache.get_or_compute("d", || compute_counted(&calls, "d")).await.unwrap();
        cache.clock().advance(minutes(61));
        let err = cache.get_or_compute("d", compute_failing).await.unwrap_err();
        assert!(err.to_string().contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_error_propagates_when_cold() {
        let cache = ResultCache::with_clock(&memory_only(), ManualClock::new());
        assert!(cache.get_or_compute("d", compute_failing).await.is_err());
    }

    #[tokio::test]
    async fn test_persisted_entry_warms_cold_cache() {
        let dir = tempfile::tempdir().unwrap();
        let calls = AtomicUsize::new(0);

        let writer = ResultCache::with_clock(&on_disk(&dir), ManualClock::new());
        writer.get_or_compute("d", || compute_counted(&calls, "d")).await.unwrap();

        let reader = ResultCache::with_clock(&on_disk(&dir), ManualClock::new());
        reader.clock().advance(minutes(2));
        let (served, status) = reader.get_or_compute("d", compute_failing).await.unwrap();
        assert_eq!(status, CacheStatus::Persisted);
        assert_eq!(served.key, "d");

        // Now in memory: the same Arc comes back
        let (again, status) = reader.get_or_compute("d", compute_failing).await.unwrap();
        assert_eq!(status, CacheStatus::Fresh);
        assert!(Arc::ptr_eq(&served, &again));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_persisted_stale_entry_served_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let calls = AtomicUsize::new(0);

        let writer = ResultCache::with_clock(&on_disk(&dir), ManualClock::new());
        writer.get_or_compute("d", || compute_counted(&calls, "d")).await.unwrap();

        let reader = ResultCache::with_clock(&on_disk(&dir), ManualClock::new());
        reader.clock().advance(minutes(30));
        let (_, status) = reader.get_or_compute("d", compute_failing).await.unwrap();
        assert_eq!(status, CacheStatus::Stale);
    }

    #[tokio::test]
    async fn test_disabled_disk_does_not_persist() {
        let dir = tempfile::tempdir().unwrap();
        let calls = AtomicUsize::new(0);
        let mut config = on_disk(&dir);
        config.enabled = false;

        let writer = ResultCache::with_clock(&config, ManualClock::new());
        writer.get_or_compute("d", || compute_counted(&calls, "d")).await.unwrap();

        let reader = ResultCache::with_clock(&on_disk(&dir), ManualClock::new());
        let (_, status) = reader.get_or_compute("d", || compute_counted(&calls, "d")).await.unwrap();
        assert_eq!(status, CacheStatus::Computed);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::with_clock(&on_disk(&dir), ManualClock::new());
        let calls = AtomicUsize::new(0);

        cache.get_or_compute("d", || compute_counted(&calls, "d")).await.unwrap();
        cache.invalidate("d");
        let (_, status) = cache.get_or_compute("d", || compute_counted(&calls, "d")).await.unwrap();
        assert_eq!(status, CacheStatus::Computed);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_memory_keeps_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::with_clock(&on_disk(&dir), ManualClock::new());
        let calls = AtomicUsize::new(0);

        cache.get_or_compute("d", || compute_counted(&calls, "d")).await.unwrap();
        cache.clear_memory();
        let (_, status) = cache.get_or_compute("d", || compute_counted(&calls, "d")).await.unwrap();
        assert_eq!(status, CacheStatus::Persisted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_cache_missing_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(clear_cache(&dir.path().join("absent")).is_ok());
    }
}
