//! KV Cache Server - A key-value server fronting a persistent store
//!
//! Reads are served from a concurrent LRU cache and fall back to the store on
//! a miss; writes and deletes go to the store first. Requests are executed by
//! a fixed pool of worker threads, each holding its own store connection.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod server;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use server::{Lifecycle, Server, ShutdownHandle};
