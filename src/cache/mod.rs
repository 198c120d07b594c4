//! Cache Module
//!
//! Provides the shared in-memory LRU cache and the request statistics.

mod entry;
mod lru;
mod shared;
mod stats;


// Re-export public types
pub use entry::Lookup;
pub(crate) use entry::CacheEntry;
pub(crate) use lru::LruCache;
pub use shared::Cache;
pub use stats::{StatsCollector, StatsSnapshot};
