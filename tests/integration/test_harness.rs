// Test harness: SQLite stores in temporary directories and a store wrapper
// that counts calls so tests can observe when the cache is bypassed.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;
use wikistore::cache::LayeredCache;
use wikistore::store::{AssetRecord, AssetStore, SqliteAssetStore, StoreError, StoreResult};
use wikistore::AssetService;

/// Delegates to a real SQLite store and records how often each call is made
pub struct CountingStore {
    inner: SqliteAssetStore,
    gets: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: SqliteAssetStore) -> Self {
        Self {
            inner,
            gets: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Store reads made through `get`
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &SqliteAssetStore {
        &self.inner
    }

    pub async fn row_count(&self, path: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM assets WHERE path = ?")
            .bind(path)
            .fetch_one(self.inner.pool())
            .await
            .unwrap()
    }
}

#[async_trait]
impl AssetStore for CountingStore {
    async fn get(&self, asset_type: &str, path: &str) -> StoreResult<String> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(asset_type, path).await
    }

    async fn get_record(&self, asset_type: &str, path: &str) -> StoreResult<AssetRecord> {
        self.inner.get_record(asset_type, path).await
    }

    async fn insert(&self, asset_type: &str, path: &str, content: &str) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(asset_type, path, content).await
    }

    async fn update(&self, asset_type: &str, path: &str, content: &str) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update(asset_type, path, content).await
    }

    async fn overwrite(&self, asset_type: &str, path: &str, content: &str) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.overwrite(asset_type, path, content).await
    }

    async fn delete(&self, asset_type: &str, path: &str) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(asset_type, path).await
    }

    fn scan_all(&self) -> BoxStream<'_, StoreResult<AssetRecord>> {
        self.inner.scan_all()
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.inner.health_check().await
    }

    async fn close(&self) {
        self.inner.close().await
    }
}

/// Holds the first `get` after it has read the row until `release` is called,
/// so a write can complete while a read-through is still in flight
pub struct GatedStore {
    inner: SqliteAssetStore,
    armed: AtomicBool,
    read_done: Notify,
    release: Notify,
}

impl GatedStore {
    pub fn new(inner: SqliteAssetStore) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(true),
            read_done: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn inner(&self) -> &SqliteAssetStore {
        &self.inner
    }

    /// Wait until the gated `get` has its result in hand
    pub async fn wait_for_read(&self) {
        self.read_done.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl AssetStore for GatedStore {
    async fn get(&self, asset_type: &str, path: &str) -> StoreResult<String> {
        let result = self.inner.get(asset_type, path).await;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.read_done.notify_one();
            self.release.notified().await;
        }
        result
    }

    async fn get_record(&self, asset_type: &str, path: &str) -> StoreResult<AssetRecord> {
        self.inner.get_record(asset_type, path).await
    }

    async fn insert(&self, asset_type: &str, path: &str, content: &str) -> StoreResult<()> {
        self.inner.insert(asset_type, path, content).await
    }

    async fn update(&self, asset_type: &str, path: &str, content: &str) -> StoreResult<()> {
        self.inner.update(asset_type, path, content).await
    }

    async fn overwrite(&self, asset_type: &str, path: &str, content: &str) -> StoreResult<()> {
        self.inner.overwrite(asset_type, path, content).await
    }

    async fn delete(&self, asset_type: &str, path: &str) -> StoreResult<()> {
        self.inner.delete(asset_type, path).await
    }

    fn scan_all(&self) -> BoxStream<'_, StoreResult<AssetRecord>> {
        self.inner.scan_all()
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.inner.health_check().await
    }

    async fn close(&self) {
        self.inner.close().await
    }
}

/// A store whose startup scan yields one row and then fails
pub struct BrokenScanStore;

#[async_trait]
impl AssetStore for BrokenScanStore {
    async fn get(&self, asset_type: &str, path: &str) -> StoreResult<String> {
        Err(StoreError::not_found(asset_type, path))
    }

    async fn get_record(&self, asset_type: &str, path: &str) -> StoreResult<AssetRecord> {
        Err(StoreError::not_found(asset_type, path))
    }

    async fn insert(&self, _: &str, _: &str, _: &str) -> StoreResult<()> {
        Ok(())
    }

    async fn update(&self, _: &str, _: &str, _: &str) -> StoreResult<()> {
        Ok(())
    }

    async fn overwrite(&self, _: &str, _: &str, _: &str) -> StoreResult<()> {
        Ok(())
    }

    async fn delete(&self, _: &str, _: &str) -> StoreResult<()> {
        Ok(())
    }

    fn scan_all(&self) -> BoxStream<'_, StoreResult<AssetRecord>> {
        let first = AssetRecord {
            asset_type: "page".to_string(),
            path: "home".to_string(),
            content: "# Home".to_string(),
            created_at: None,
            updated_at: None,
        };
        stream::iter(vec![
            Ok(first),
            Err(StoreError::Database(sqlx::Error::PoolClosed)),
        ])
        .boxed()
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn close(&self) {}
}

/// Open a file-backed store inside a fresh temporary directory
pub async fn sqlite_store(dir: &TempDir) -> SqliteAssetStore {
    SqliteAssetStore::new(
        dir.path().join("db.sqlite3"),
        Duration::from_secs(5),
        1,
    )
    .await
    .unwrap()
}

pub struct Harness {
    pub service: AssetService,
    pub store: Arc<CountingStore>,
    _dir: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_cache(LayeredCache::new(100, 10), Duration::from_secs(300)).await
    }

    pub async fn with_cache(cache: LayeredCache, ttl: Duration) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(CountingStore::new(sqlite_store(&dir).await));
        let service = AssetService::with_cache(store.clone(), cache, ttl)
            .await
            .unwrap();
        Self {
            service,
            store,
            _dir: dir,
        }
    }
}
