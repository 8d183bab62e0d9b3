//! In-memory asset cache
//!
//! `LayeredCache` keeps asset content keyed by `(asset type, path)` with a
//! per-entry expiry. It is bounded by item count: once the bound is exceeded
//! a batch of least-recently-used entries is pruned in one go.
//!
//! Every write bumps a write epoch. A reader that missed records the epoch
//! it saw and backfills through [`LayeredCache::fill`], which refuses the
//! value if any write landed in between, so a slow store read cannot
//! resurrect content that a save or delete already replaced.

use lru::LruCache;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::config::CacheConfig;
use super::entry::{AssetKey, CacheEntry};
use super::stats::{CacheStats, CacheStatsTracker};

pub struct LayeredCache {
    // unbounded: capacity is enforced by `prune_locked`, not by the LRU itself
    entries: Mutex<LruCache<AssetKey, CacheEntry>>,
    stats: CacheStatsTracker,
    // only modified while `entries` is locked
    write_epoch: AtomicU64,
    max_entries: usize,
    prune_batch: usize,
}

/// Result of [`LayeredCache::lookup`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(String),
    /// Absent or expired; `epoch` is the write epoch observed with the miss
    Miss { epoch: u64 },
}

impl LayeredCache {
    /// Create a cache holding at most `max_entries` items (a zero bound is
    /// treated as one), pruning `prune_batch` items when the bound is exceeded.
    pub fn new(max_entries: usize, prune_batch: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::unbounded()),
            stats: CacheStatsTracker::default(),
            write_epoch: AtomicU64::new(0),
            max_entries: max_entries.max(1),
            prune_batch: prune_batch.max(1),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, config.prune_batch)
    }

    /// Cached content for `key`, or None when absent or expired.
    /// A hit marks the entry as most recently used.
    pub fn get(&self, key: &AssetKey) -> Option<String> {
        match self.lookup(key) {
            CacheLookup::Hit(content) => Some(content),
            CacheLookup::Miss { .. } => None,
        }
    }

    /// Like [`get`](Self::get), but a miss carries the write epoch to hand
    /// back to [`fill`](Self::fill).
    pub fn lookup(&self, key: &AssetKey) -> CacheLookup {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                self.stats.increment_hits();
                return CacheLookup::Hit(entry.content.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
            self.stats.add_expirations(1);
        }
        self.stats.increment_misses();
        CacheLookup::Miss {
            epoch: self.write_epoch.load(Ordering::Relaxed),
        }
    }

    /// Insert or replace the entry, resetting its TTL and recency.
    pub fn set(&self, key: AssetKey, content: String, ttl: Duration) {
        let mut entries = self.entries.lock();
        self.bump_epoch();
        self.put_locked(&mut entries, key, content, ttl);
    }

    /// Backfill after a miss. The entry is stored only if no write happened
    /// since `epoch` was observed and no live entry exists for `key`.
    /// Returns whether the value was stored.
    pub fn fill(&self, key: AssetKey, content: String, ttl: Duration, epoch: u64) -> bool {
        let mut entries = self.entries.lock();
        if self.write_epoch.load(Ordering::Relaxed) != epoch {
            tracing::debug!(key = %key, "cache written since miss, skipping backfill");
            return false;
        }
        if entries.peek(&key).is_some_and(|entry| !entry.is_expired()) {
            return false;
        }
        self.put_locked(&mut entries, key, content, ttl);
        true
    }

    /// Remove the entry. Returns true if it was present.
    pub fn delete(&self, key: &AssetKey) -> bool {
        let mut entries = self.entries.lock();
        self.bump_epoch();
        entries.pop(key).is_some()
    }

    /// Remove `path` under every asset type. Returns the number of entries removed.
    pub fn invalidate_path(&self, path: &str) -> usize {
        let mut entries = self.entries.lock();
        self.bump_epoch();
        let keys: Vec<AssetKey> = entries
            .iter()
            .filter(|(key, _)| key.path == path)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &keys {
            entries.pop(key);
        }
        keys.len()
    }

    /// Whether a live entry exists, without touching recency or stats.
    pub fn contains(&self, key: &AssetKey) -> bool {
        self.entries
            .lock()
            .peek(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let expired: Vec<AssetKey> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }
        self.stats.add_expirations(expired.len() as u64);
        expired.len()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        self.bump_epoch();
        entries.clear();
    }

    /// Number of stored entries, expired ones included until they are touched
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
            .snapshot(self.len() as u64, self.max_entries as u64)
    }

    fn bump_epoch(&self) {
        self.write_epoch.fetch_add(1, Ordering::Relaxed);
    }

    fn put_locked(
        &self,
        entries: &mut LruCache<AssetKey, CacheEntry>,
        key: AssetKey,
        content: String,
        ttl: Duration,
    ) {
        entries.put(key, CacheEntry::new(content, ttl));

        if entries.len() > self.max_entries {
            let pruned = self.prune_locked(entries);
            tracing::debug!(
                pruned,
                remaining = entries.len(),
                max_entries = self.max_entries,
                "cache over capacity, pruned least recently used entries"
            );
        }
    }

    fn prune_locked(&self, entries: &mut LruCache<AssetKey, CacheEntry>) -> usize {
        let mut pruned = 0;
        while pruned < self.prune_batch && entries.pop_lru().is_some() {
            pruned += 1;
        }
        self.stats.add_evictions(pruned as u64);
        pruned
    }
}

impl Default for LayeredCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
