//! Response DTOs for the key-value API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::StatsSnapshot;

/// Response body for a successful read (GET /api/kv)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for successful writes and deletes
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub status: &'static str,
}

impl SuccessResponse {
    pub fn new() -> Self {
        Self { status: "success" }
    }
}

impl Default for SuccessResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Operations dispatched since start
    pub total_requests: u64,
    /// Reads served from the cache
    pub cache_hits: u64,
    /// Reads that fell through to the store
    pub cache_misses: u64,
    /// cache_hits / total_requests
    pub hit_rate: f64,
    /// Entries currently cached
    pub cache_entries: usize,
    /// Configured cache capacity
    pub cache_capacity: usize,
}

impl StatsResponse {
    pub fn new(snapshot: StatsSnapshot, cache_entries: usize, cache_capacity: usize) -> Self {
        Self {
            total_requests: snapshot.total_requests,
            cache_hits: snapshot.cache_hits,
            cache_misses: snapshot.cache_misses,
            hit_rate: snapshot.hit_rate,
            cache_entries,
            cache_capacity,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
