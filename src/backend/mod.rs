//! Backend Module
//!
//! The persistent store contract consumed by dispatch workers, plus the
//! backends that implement it.
//!
//! Every worker owns one [`Store`] produced by a shared [`StoreConnector`].
//! A store is `Send` but never `Sync`: connections move into a worker and
//! stay there.

mod memory;
mod reconnect;
mod redis_store;

use std::sync::Arc;

use crate::cache::Lookup;
use crate::error::StoreError;

pub use self::memory::{MemoryConnector, MemoryStore};
pub use self::reconnect::ReconnectingStore;
pub use self::redis_store::{RedisConnector, RedisSession, DEFAULT_TABLE};

// == Store ==
/// One connection to the persistent key-value store.
pub trait Store: Send {
    /// Fetches `key`. An empty stored value is `Found("")`.
    fn get(&mut self, key: &str) -> Result<Lookup, StoreError>;

    /// Writes `key`, replacing any previous value.
    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes `key`. Deleting an absent key succeeds.
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;
}

// == Store Connector ==
/// Produces a dedicated store connection for each worker.
pub trait StoreConnector: Send + Sync {
    /// Opens a new connection.
    fn connect(&self) -> Result<Box<dyn Store>, StoreError>;

    /// Human-readable backend description for logs. Must not leak credentials.
    fn describe(&self) -> String;
}

/// Builds a connector from a store URL.
///
/// - `memory` or `memory://` selects the in-process backend
/// - `redis://...` selects the Redis backend
pub fn connector_from_url(url: &str) -> Result<Arc<dyn StoreConnector>, StoreError> {
    match url {
        "memory" | "memory://" => Ok(Arc::new(MemoryConnector::new())),
        _ if url.starts_with("redis://") || url.starts_with("redis+unix://") => {
            Ok(Arc::new(RedisConnector::open(url)?))
        }
        _ => Err(StoreError::Connection(format!(
            "unsupported store URL '{}'",
            url
        ))),
    }
}
