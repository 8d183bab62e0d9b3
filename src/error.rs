// Error types module

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the asset service to its callers
///
/// Adapters map `NotFound` and `InvalidInput` to client errors and everything
/// else to a server error.
#[derive(Error, Debug)]
pub enum AssetError {
    /// The asset does not exist in the store
    #[error("asset not found: {asset_type}:{path}")]
    NotFound { asset_type: String, path: String },

    /// Rejected before touching cache or store (empty type or path)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transaction or connection failure, reported verbatim
    #[error("store error: {0}")]
    Store(StoreError),

    /// Startup scan failed; the service cannot start without a warm cache
    #[error("cache warm-up failed: {0}")]
    Enumeration(StoreError),
}

impl AssetError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AssetError::NotFound { .. })
    }
}

impl From<StoreError> for AssetError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { asset_type, path } => AssetError::NotFound { asset_type, path },
            other => AssetError::Store(other),
        }
    }
}

pub type AssetResult<T> = std::result::Result<T, AssetError>;
