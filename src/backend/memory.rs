//! In-process store backend.
//!
//! All connections opened from one [`MemoryConnector`] see the same map.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::backend::{Store, StoreConnector};
use crate::cache::Lookup;
use crate::error::StoreError;

type Table = Arc<RwLock<HashMap<String, String>>>;

/// Connector for the in-process backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    table: Table,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the persisted value directly, bypassing any connection.
    pub fn value(&self, key: &str) -> Option<String> {
        self.table.read().get(key).cloned()
    }

    /// Number of persisted keys.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }
}

impl StoreConnector for MemoryConnector {
    fn connect(&self) -> Result<Box<dyn Store>, StoreError> {
        Ok(Box::new(MemoryStore {
            table: Arc::clone(&self.table),
        }))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// A handle onto the connector's shared map.
#[derive(Debug)]
pub struct MemoryStore {
    table: Table,
}

impl Store for MemoryStore {
    fn get(&mut self, key: &str) -> Result<Lookup, StoreError> {
        Ok(self.table.read().get(key).cloned().into())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.table.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.table.write().remove(key);
        Ok(())
    }
}
