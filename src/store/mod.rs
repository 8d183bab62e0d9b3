//! Persistent asset store
//!
//! The store is the single source of truth for assets. It is keyed by `path`
//! with the asset type kept as an attribute:
//! - `AssetStore`: async trait the coordinator talks to
//! - `SqliteAssetStore`: sqlx/SQLite implementation
//! - `StoreError`: NotFound / Conflict / Database failures

use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::stream::BoxStream;
use serde::Serialize;

pub mod error;
pub mod schema;
pub mod sqlite;

pub use error::{StoreError, StoreResult};
pub use sqlite::SqliteAssetStore;

/// A stored asset row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct AssetRecord {
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub asset_type: String,
    pub path: String,
    pub content: String,
    #[sqlx(rename = "create_at", default)]
    pub created_at: Option<NaiveDateTime>,
    #[sqlx(rename = "update_at", default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Which branch of an upsert wrote the row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Content of the asset matching both `path` and `asset_type`
    async fn get(&self, asset_type: &str, path: &str) -> StoreResult<String>;

    /// Full row including timestamps
    async fn get_record(&self, asset_type: &str, path: &str) -> StoreResult<AssetRecord>;

    /// Fails with `Conflict` when any row already owns `path`
    async fn insert(&self, asset_type: &str, path: &str, content: &str) -> StoreResult<()>;

    /// Updates the row matching `path` and `asset_type`.
    /// Zero affected rows is not an error.
    async fn update(&self, asset_type: &str, path: &str, content: &str) -> StoreResult<()>;

    /// Rewrites the row owning `path`, taking it over for `asset_type`
    async fn overwrite(&self, asset_type: &str, path: &str, content: &str) -> StoreResult<()>;

    /// Removes the row if present
    async fn delete(&self, asset_type: &str, path: &str) -> StoreResult<()>;

    /// One-shot enumeration of every row, used for cache warm-up
    fn scan_all(&self) -> BoxStream<'_, StoreResult<AssetRecord>>;

    async fn health_check(&self) -> StoreResult<()>;

    async fn close(&self);

    /// Insert, falling back to `overwrite` when the path is taken.
    /// Any failure other than `Conflict` is returned as-is.
    async fn upsert(
        &self,
        asset_type: &str,
        path: &str,
        content: &str,
    ) -> StoreResult<UpsertOutcome> {
        match self.insert(asset_type, path, content).await {
            Ok(()) => Ok(UpsertOutcome::Inserted),
            Err(StoreError::Conflict(_)) => {
                tracing::trace!(asset_type, path, "insert conflicted, falling back to update");
                self.overwrite(asset_type, path, content).await?;
                Ok(UpsertOutcome::Updated)
            }
            Err(err) => Err(err),
        }
    }
}
