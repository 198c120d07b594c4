//! Request DTOs for the key-value API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::dispatch::{OpKind, Operation};

/// Request body for the write operation (POST /api/kv)
///
/// Missing fields deserialize to empty values so the request still reaches
/// the dispatcher and is rejected there as a validation error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PutRequest {
    /// The key to write
    #[serde(default)]
    pub key: String,
    /// The value to store
    #[serde(default)]
    pub value: Option<String>,
}

impl PutRequest {
    /// Converts the body into a write operation.
    pub fn into_operation(self) -> Operation {
        Operation {
            kind: OpKind::Write,
            key: self.key,
            value: self.value,
        }
    }
}

/// Query string for reads and deletes (`?key=...`)
#[derive(Debug, Clone, Default)]
pub struct KeyQuery {
    pub key: Option<String>,
}

impl KeyQuery {
    /// Builds the query from raw pairs, keeping the first `key` parameter.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let key = pairs
            .into_iter()
            .find_map(|(name, value)| (name == "key").then_some(value));
        Self { key }
    }

    /// The requested key, empty when the parameter is missing.
    pub fn key(self) -> String {
        self.key.unwrap_or_default()
    }
}
