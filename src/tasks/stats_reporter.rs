//! Stats Reporter Task
//!
//! Background task that periodically logs the request counters.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::cache::StatsCollector;

/// Spawns a task that logs a stats snapshot every `interval_secs` seconds.
///
/// The first report is emitted after one full interval. The task runs until
/// aborted; the caller keeps the handle to stop it on shutdown.
pub fn spawn_stats_reporter(stats: Arc<StatsCollector>, interval_secs: u64) -> JoinHandle<()> {
    let period = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!("Stats reporter running every {} seconds", period.as_secs());

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let snapshot = stats.snapshot();
            info!(
                total_requests = snapshot.total_requests,
                cache_hits = snapshot.cache_hits,
                cache_misses = snapshot.cache_misses,
                hit_rate = snapshot.hit_rate,
                "Server stats"
            );
        }
    })
}
