//! Error types for persistent store operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("asset not found: {asset_type}:{path}")]
    NotFound { asset_type: String, path: String },

    #[error("asset path already exists: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn not_found(asset_type: &str, path: &str) -> Self {
        StoreError::NotFound {
            asset_type: asset_type.to_string(),
            path: path.to_string(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

// SQLite reports primary key and UNIQUE violations as
// "UNIQUE constraint failed: assets.path"
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation()
                    || db_err.message().contains("UNIQUE constraint failed") =>
            {
                StoreError::Conflict(db_err.message().to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
