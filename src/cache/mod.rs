// Cache module
//
// In-memory, time-limited cache of asset content keyed by (asset type, path).

pub mod config;
pub mod entry;
pub mod layered;
pub mod stats;
pub mod warming;

pub use config::{CacheConfig, MAX_TTL};
pub use entry::{AssetKey, CacheEntry};
pub use layered::{CacheLookup, LayeredCache};
pub use stats::CacheStats;
pub use warming::{warm_cache, WarmupReport};
