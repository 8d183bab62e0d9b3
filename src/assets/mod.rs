//! Asset access service
//!
//! `AssetService` is the only entry point callers use. It owns one store
//! handle and one cache and keeps them coherent:
//! - reads go to the cache first and fall back to the store, backfilling
//!   unless a save or delete touched the cache while the store was read
//! - saves refresh the cache and then upsert into the store
//! - deletes remove the row and then the cached entry
//!
//! The cache and store are not updated atomically together. A save is visible
//! in the cache slightly before its store transaction commits.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{
    warm_cache, AssetKey, CacheConfig, CacheLookup, CacheStats, LayeredCache, WarmupReport,
};
use crate::error::{AssetError, AssetResult};
use crate::store::{AssetRecord, AssetStore};

/// Wiki page asset type
pub const PAGE: &str = "page";
/// Raw file asset type
pub const FILE: &str = "file";

pub struct AssetService {
    store: Arc<dyn AssetStore>,
    cache: LayeredCache,
    ttl: Duration,
    warmup: WarmupReport,
}

impl AssetService {
    /// Build the service and warm its cache from every stored row.
    /// A failed scan aborts construction.
    pub async fn new(store: Arc<dyn AssetStore>, config: &CacheConfig) -> AssetResult<Self> {
        Self::with_cache(store, LayeredCache::from_config(config), config.ttl()).await
    }

    /// Build the service around a prepared cache; `ttl` applies to every entry.
    pub async fn with_cache(
        store: Arc<dyn AssetStore>,
        cache: LayeredCache,
        ttl: Duration,
    ) -> AssetResult<Self> {
        let warmup = warm_cache(store.as_ref(), &cache, ttl)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "cache warm-up failed");
                AssetError::Enumeration(err)
            })?;

        Ok(Self {
            store,
            cache,
            ttl,
            warmup,
        })
    }

    pub async fn get_asset(&self, asset_type: &str, path: &str) -> AssetResult<String> {
        validate(asset_type, path)?;
        let key = AssetKey::new(asset_type, path);

        let epoch = match self.cache.lookup(&key) {
            CacheLookup::Hit(content) => {
                tracing::trace!(asset_type, path, source = "cache", "got asset");
                return Ok(content);
            }
            CacheLookup::Miss { epoch } => epoch,
        };

        tracing::trace!(asset_type, path, source = "store", "get asset");
        let content = self.store.get(asset_type, path).await?;
        self.cache.fill(key, content.clone(), self.ttl, epoch);
        Ok(content)
    }

    /// Create or replace an asset.
    ///
    /// Paths form one namespace across types: saving `file:x` over an
    /// existing `page:x` takes the row over, and `page:x` stops resolving.
    pub async fn save_asset(&self, asset_type: &str, path: &str, content: &str) -> AssetResult<()> {
        validate(asset_type, path)?;
        tracing::trace!(asset_type, path, "save asset");

        let key = AssetKey::new(asset_type, path);
        self.cache.invalidate_path(path);
        self.cache.set(key.clone(), content.to_string(), self.ttl);

        match self.store.upsert(asset_type, path, content).await {
            Ok(outcome) => {
                tracing::debug!(asset_type, path, ?outcome, "asset saved");
                Ok(())
            }
            Err(err) => {
                // nothing was committed, stop serving the optimistic entry
                self.cache.delete(&key);
                Err(err.into())
            }
        }
    }

    /// Update the stored content of an existing asset.
    ///
    /// The cache is left alone: a cached copy stays served until its TTL
    /// lapses. Use `save_asset` when readers must see the change at once.
    pub async fn update_asset(
        &self,
        asset_type: &str,
        path: &str,
        content: &str,
    ) -> AssetResult<()> {
        validate(asset_type, path)?;
        tracing::trace!(asset_type, path, "update asset");
        self.store.update(asset_type, path, content).await?;
        Ok(())
    }

    /// Delete an asset. Deleting a missing asset succeeds.
    pub async fn delete_asset(&self, asset_type: &str, path: &str) -> AssetResult<()> {
        validate(asset_type, path)?;
        tracing::trace!(asset_type, path, "delete asset");

        self.store.delete(asset_type, path).await?;
        // invalidate now rather than serving a deleted asset until expiry
        self.cache.delete(&AssetKey::new(asset_type, path));
        Ok(())
    }

    /// Stored row with timestamps, read straight from the store
    pub async fn asset_record(&self, asset_type: &str, path: &str) -> AssetResult<AssetRecord> {
        validate(asset_type, path)?;
        Ok(self.store.get_record(asset_type, path).await?)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn warmup_report(&self) -> &WarmupReport {
        &self.warmup
    }

    pub fn cache(&self) -> &LayeredCache {
        &self.cache
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn health_check(&self) -> AssetResult<()> {
        Ok(self.store.health_check().await?)
    }

    /// Close the store. Calls made afterwards fail with a store error.
    pub async fn close(&self) {
        self.cache.clear();
        self.store.close().await;
        tracing::debug!("asset service closed");
    }
}

fn validate(asset_type: &str, path: &str) -> AssetResult<()> {
    if asset_type.is_empty() {
        return Err(AssetError::InvalidInput(
            "asset type cannot be empty".to_string(),
        ));
    }
    if path.is_empty() {
        return Err(AssetError::InvalidInput("path cannot be empty".to_string()));
    }
    Ok(())
}
