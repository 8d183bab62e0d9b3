//! Startup cache warm-up

use futures::TryStreamExt;
use serde::Serialize;
use std::time::{Duration, Instant};

use super::entry::AssetKey;
use super::layered::LayeredCache;
use crate::store::{AssetStore, StoreResult};

/// Outcome of a warm-up pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct WarmupReport {
    /// Rows read from the store
    pub rows_scanned: u64,
    /// Entries resident in the cache afterwards
    pub entries_cached: u64,
    pub duration_ms: u64,
}

/// Load every stored asset into the cache with the given TTL.
///
/// The first row error aborts the pass and is returned; rows already loaded
/// stay cached.
pub async fn warm_cache(
    store: &dyn AssetStore,
    cache: &LayeredCache,
    ttl: Duration,
) -> StoreResult<WarmupReport> {
    let started = Instant::now();
    let mut rows = store.scan_all();
    let mut rows_scanned = 0u64;

    while let Some(record) = rows.try_next().await? {
        cache.set(
            AssetKey::new(record.asset_type, record.path),
            record.content,
            ttl,
        );
        rows_scanned += 1;
    }

    let report = WarmupReport {
        rows_scanned,
        entries_cached: cache.len() as u64,
        duration_ms: started.elapsed().as_millis() as u64,
    };

    tracing::info!(
        rows_scanned = report.rows_scanned,
        entries_cached = report.entries_cached,
        duration_ms = report.duration_ms,
        "cache warm-up complete"
    );

    Ok(report)
}
