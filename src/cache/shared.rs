//! Shared Cache Module
//!
//! Thread-safe wrapper around [`LruCache`] used by every dispatch worker.

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{LruCache, Lookup};

// == Cache ==
/// Fixed-capacity LRU cache shared across workers.
///
/// Every operation runs inside one short critical section. The lock is
/// never held across anything but the LRU bookkeeping itself.
#[derive(Debug)]
pub struct Cache {
    inner: Mutex<LruCache>,
}

impl Cache {
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Looks up `key`, promoting it to most recently used when found.
    pub fn get(&self, key: &str) -> Lookup {
        self.inner.lock().get(key)
    }

    /// Inserts or updates `key`, evicting the least recently used entry when
    /// the cache is full.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        let evicted = self.inner.lock().put(key.into(), value.into());
        if let Some(evicted) = evicted {
            debug!("Evicted LRU key '{}'", evicted);
        }
    }

    /// Removes `key` if present. Absent keys are a no-op.
    pub fn del(&self, key: &str) {
        self.inner.lock().del(key);
    }

    /// Checks membership without touching recency.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains(key)
    }

    /// Reads a value without touching recency.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.inner.lock().peek(key).map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().keys()
    }

    /// Verifies the lookup table and recency list agree.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.inner.lock().check_invariants()
    }
}
