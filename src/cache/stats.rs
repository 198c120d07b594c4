//! Cache Statistics Module
//!
//! Tracks request, hit and miss counters shared by all dispatch workers.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Stats Collector ==
/// Monotonic request counters. Each counter is independently atomic.
#[derive(Debug, Default)]
pub struct StatsCollector {
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl StatsCollector {
    // == Constructor ==
    /// Creates a collector with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one dispatched operation.
    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a read served from the cache.
    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a read that fell through to the store.
    pub fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    // == Snapshot ==
    /// Reads every counter at roughly the same point in time.
    ///
    /// The counters are not read transactionally, so a snapshot taken under
    /// load may not correspond to any single request boundary.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot::new(self.total_requests(), self.cache_hits(), self.cache_misses())
    }
}

// == Stats Snapshot ==
/// Point-in-time view of the counters, as served on `/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// cache_hits / total_requests, or 0.0 before any request
    pub hit_rate: f64,
}

impl StatsSnapshot {
    pub fn new(total_requests: u64, cache_hits: u64, cache_misses: u64) -> Self {
        let hit_rate = if total_requests > 0 {
            cache_hits as f64 / total_requests as f64
        } else {
            0.0
        };
        Self {
            total_requests,
            cache_hits,
            cache_misses,
            hit_rate,
        }
    }
}
