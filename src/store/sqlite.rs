//! SQLite-backed asset store

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions,
    SqliteQueryResult, SqliteSynchronous,
};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use super::error::{StoreError, StoreResult};
use super::schema::MIGRATIONS;
use super::{AssetRecord, AssetStore};
use crate::config::DatabaseConfig;

const SELECT_RECORD: &str = "SELECT COALESCE(type, '') AS type, path, COALESCE(content, '') AS content, \
     create_at, update_at FROM assets WHERE path = ? AND type = ?";

/// SQLite asset store.
///
/// Writes run one statement per transaction; with the default single pooled
/// connection SQLite serialises them and `busy_timeout` absorbs contention.
pub struct SqliteAssetStore {
    pool: Pool<Sqlite>,
}

impl SqliteAssetStore {
    /// Open (creating if needed) the database file and bootstrap the schema.
    pub async fn new(
        path: impl AsRef<Path>,
        busy_timeout: Duration,
        max_connections: u32,
    ) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::info!(
            database = %path.display(),
            busy_timeout_ms = busy_timeout.as_millis() as u64,
            "asset store opened"
        );

        Ok(store)
    }

    pub async fn from_config(config: &DatabaseConfig) -> StoreResult<Self> {
        Self::new(&config.path, config.busy_timeout(), config.max_connections).await
    }

    /// Private in-memory database. Pinned to one connection that never
    /// expires, otherwise the data would vanish with it.
    pub async fn in_memory() -> StoreResult<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Create tables and triggers. Idempotent.
    pub async fn migrate(&self) -> StoreResult<()> {
        tracing::debug!("create database tables");
        for statement in MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run a single mutating statement inside its own transaction.
    /// Any failure rolls the transaction back and is returned unchanged.
    async fn execute_write<'q>(
        &self,
        operation: &'static str,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> StoreResult<SqliteQueryResult> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| log_failure(operation, err.into()))?;

        match query.execute(&mut *tx).await {
            Ok(result) => {
                tx.commit()
                    .await
                    .map_err(|err| log_failure(operation, err.into()))?;
                Ok(result)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(operation, error = %rollback_err, "rollback failed");
                }
                Err(log_failure(operation, err.into()))
            }
        }
    }
}

fn log_failure(operation: &'static str, err: StoreError) -> StoreError {
    match &err {
        // expected on every re-save, handled by the caller
        StoreError::Conflict(_) => tracing::debug!(operation, error = %err, "write conflicted"),
        _ => tracing::error!(operation, error = %err, "store write failed"),
    }
    err
}

#[async_trait]
impl AssetStore for SqliteAssetStore {
    async fn get(&self, asset_type: &str, path: &str) -> StoreResult<String> {
        let content = sqlx::query_scalar::<_, String>(
            "SELECT COALESCE(content, '') FROM assets WHERE path = ? AND type = ?",
        )
        .bind(path)
        .bind(asset_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| {
            tracing::error!(asset_type, path, error = %err, "asset lookup failed");
            StoreError::from(err)
        })?;

        content.ok_or_else(|| StoreError::not_found(asset_type, path))
    }

    async fn get_record(&self, asset_type: &str, path: &str) -> StoreResult<AssetRecord> {
        sqlx::query_as::<_, AssetRecord>(SELECT_RECORD)
            .bind(path)
            .bind(asset_type)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found(asset_type, path))
    }

    async fn insert(&self, asset_type: &str, path: &str, content: &str) -> StoreResult<()> {
        let query = sqlx::query("INSERT INTO assets(type, path, content) VALUES(?, ?, ?)")
            .bind(asset_type)
            .bind(path)
            .bind(content);
        self.execute_write("insert", query).await?;
        Ok(())
    }

    async fn update(&self, asset_type: &str, path: &str, content: &str) -> StoreResult<()> {
        let query = sqlx::query("UPDATE assets SET content = ? WHERE path = ? AND type = ?")
            .bind(content)
            .bind(path)
            .bind(asset_type);
        let result = self.execute_write("update", query).await?;

        if result.rows_affected() == 0 {
            tracing::debug!(asset_type, path, "update matched no rows");
        }
        Ok(())
    }

    async fn overwrite(&self, asset_type: &str, path: &str, content: &str) -> StoreResult<()> {
        let query = sqlx::query("UPDATE assets SET content = ?, type = ? WHERE path = ?")
            .bind(content)
            .bind(asset_type)
            .bind(path);
        self.execute_write("overwrite", query).await?;
        Ok(())
    }

    async fn delete(&self, asset_type: &str, path: &str) -> StoreResult<()> {
        let query = sqlx::query("DELETE FROM assets WHERE path = ? AND type = ?")
            .bind(path)
            .bind(asset_type);
        self.execute_write("delete", query).await?;
        Ok(())
    }

    fn scan_all(&self) -> BoxStream<'_, StoreResult<AssetRecord>> {
        sqlx::query_as::<_, AssetRecord>(
            "SELECT COALESCE(type, '') AS type, path, COALESCE(content, '') AS content FROM assets",
        )
        .fetch(&self.pool)
        .map_err(StoreError::from)
        .boxed()
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
