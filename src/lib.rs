// Wikistore library
//
// Typed text assets (wiki pages and raw files) kept in SQLite and served
// through a time-limited in-memory cache.

pub mod assets;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod render;
pub mod store;

pub use assets::AssetService;
pub use error::{AssetError, AssetResult};
