//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Stats Reporter: Logs request and hit counters at a configured interval

mod stats_reporter;

pub use stats_reporter::spawn_stats_reporter;
