//! Cache configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest accepted entry lifetime (one year)
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upper bound on cached entries (bounds memory)
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Entries evicted at once when the bound is exceeded
    #[serde(default = "default_prune_batch")]
    pub prune_batch: usize,
    /// Freshness window for every cached entry
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            prune_batch: default_prune_batch(),
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

fn default_max_entries() -> usize {
    100
}

fn default_prune_batch() -> usize {
    10
}

fn default_ttl_seconds() -> u64 {
    300 // 5 minutes
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_entries == 0 {
            return Err("cache.max_entries must be greater than 0".to_string());
        }
        if self.prune_batch == 0 {
            return Err("cache.prune_batch must be greater than 0".to_string());
        }
        if self.prune_batch > self.max_entries {
            return Err(format!(
                "cache.prune_batch ({}) cannot be greater than cache.max_entries ({})",
                self.prune_batch, self.max_entries
            ));
        }
        if self.ttl_seconds == 0 {
            return Err("cache.ttl_seconds must be greater than 0".to_string());
        }
        if self.ttl_seconds > MAX_TTL.as_secs() {
            return Err(format!(
                "cache.ttl_seconds ({}) cannot exceed {} (one year)",
                self.ttl_seconds,
                MAX_TTL.as_secs()
            ));
        }
        Ok(())
    }
}
