//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

use crate::error::ServerError;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server port (0 picks an ephemeral port)
    pub server_port: u16,
    /// Maximum number of entries the cache can hold
    pub cache_capacity: usize,
    /// Number of dispatch worker threads, one store connection each
    pub worker_threads: usize,
    /// Bounded job queue between the acceptor and the workers
    pub queue_depth: usize,
    /// Persistent store location, `memory://` or `redis://host:port/db`
    pub store_url: String,
    /// Seconds between periodic stats log lines, 0 disables them
    pub stats_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `CACHE_SIZE` - Maximum cache entries (default: 1000)
    /// - `THREAD_POOL_SIZE` - Worker threads (default: 8)
    /// - `QUEUE_DEPTH` - Pending request queue size (default: 1024)
    /// - `STORE_URL` - Persistent store URL (default: memory://)
    /// - `STATS_INTERVAL` - Stats report frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cache_capacity: env_or("CACHE_SIZE", defaults.cache_capacity),
            worker_threads: env_or("THREAD_POOL_SIZE", defaults.worker_threads),
            queue_depth: env_or("QUEUE_DEPTH", defaults.queue_depth),
            store_url: env::var("STORE_URL").unwrap_or(defaults.store_url),
            stats_interval: env_or("STATS_INTERVAL", defaults.stats_interval),
        }
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.cache_capacity == 0 {
            return Err(ServerError::InvalidConfig(
                "cache capacity must be positive".to_string(),
            ));
        }
        if self.worker_threads == 0 {
            return Err(ServerError::InvalidConfig(
                "worker pool size must be positive".to_string(),
            ));
        }
        if self.queue_depth == 0 {
            return Err(ServerError::InvalidConfig(
                "queue depth must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Address the HTTP listener binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.server_port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            cache_capacity: 1000,
            worker_threads: 8,
            queue_depth: 1024,
            store_url: "memory://".to_string(),
            stats_interval: 60,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
