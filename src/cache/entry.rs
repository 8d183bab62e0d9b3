//! Cache key and entry types
//!
//! This module defines the core cache entry structures:
//! - `AssetKey`: Composite identifier for a cached asset (asset type + path)
//! - `CacheEntry`: Cached content with the timestamps used for TTL checks

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::config::MAX_TTL;

/// Cache key for identifying cached assets
/// Equality and hashing cover both the asset type and the path
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetKey {
    /// Asset type ("page", "file", ...)
    pub asset_type: String,
    /// Path within the asset type
    pub path: String,
}

impl AssetKey {
    pub fn new(asset_type: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            asset_type: asset_type.into(),
            path: path.into(),
        }
    }
}

impl std::fmt::Display for AssetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "type:path", paths may themselves contain ':'
        write!(f, "{}:{}", self.asset_type, self.path)
    }
}

impl std::str::FromStr for AssetKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (asset_type, path) = s
            .split_once(':')
            .ok_or_else(|| "Invalid asset key format: missing ':' separator".to_string())?;

        if asset_type.is_empty() {
            return Err("Invalid asset key format: asset type cannot be empty".to_string());
        }

        if path.is_empty() {
            return Err("Invalid asset key format: path cannot be empty".to_string());
        }

        Ok(AssetKey::new(asset_type, path))
    }
}

/// Cached asset content
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub content: String,
    /// When this entry was inserted or last refreshed
    pub inserted_at: Instant,
    /// When this entry stops being served
    pub expires_at: Instant,
}

impl CacheEntry {
    /// `ttl` is capped at [`MAX_TTL`]
    pub fn new(content: String, ttl: Duration) -> Self {
        let now = Instant::now();
        let ttl = ttl.min(MAX_TTL);
        Self {
            content,
            inserted_at: now,
            expires_at: now.checked_add(ttl).unwrap_or(now),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
