//! Cache Entry Module
//!
//! Defines the recency-list node stored in the LRU arena and the tagged
//! lookup result shared by the cache and the persistent store.

// == Lookup ==
/// Result of a key lookup.
///
/// A key stored with an empty value is `Found(String::new())`, which is
/// distinct from `NotFound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The key is present with the given value
    Found(String),
    /// The key is absent
    NotFound,
}

impl Lookup {
    /// Returns true if the key was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// Converts into an `Option`, consuming the lookup.
    pub fn into_value(self) -> Option<String> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}

impl From<Option<String>> for Lookup {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::NotFound,
        }
    }
}

// == Cache Entry ==
/// A key-value pair positioned in the recency-ordered list.
///
/// `prev` points towards the head (more recently used), `next` towards the
/// tail (less recently used). Both are slot indices into the owning arena.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The entry key, mirrored in the lookup table
    pub key: String,
    /// The stored value
    pub value: String,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
}

impl CacheEntry {
    /// Creates a detached entry.
    pub fn new(key: String, value: String) -> Self {
        Self {
            key,
            value,
            prev: None,
            next: None,
        }
    }
}
