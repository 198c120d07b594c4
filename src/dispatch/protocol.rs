//! Cache-aside read path and write-through write/delete paths.
//!
//! Store mutations always happen before the matching cache mutation, and a
//! failed store call leaves the cache untouched.

use tracing::error;

use crate::backend::Store;
use crate::cache::{Cache, Lookup, StatsCollector};
use crate::dispatch::{OpKind, Operation, RequestOutcome};

/// Applies one operation against the cache and the worker's store.
///
/// `total_requests` is counted exactly once per call, whatever the outcome.
/// Validation failures count toward neither hits nor misses.
pub fn dispatch(
    op: Operation,
    cache: &Cache,
    store: &mut dyn Store,
    stats: &StatsCollector,
) -> RequestOutcome {
    stats.record_request();

    if op.key.is_empty() {
        return RequestOutcome::validation_error();
    }

    match op.kind {
        OpKind::Read => read(&op.key, cache, store, stats),
        OpKind::Write => match op.value {
            Some(value) => write(op.key, value, cache, store),
            None => RequestOutcome::validation_error(),
        },
        OpKind::Delete => delete(&op.key, cache, store),
    }
}

fn read(key: &str, cache: &Cache, store: &mut dyn Store, stats: &StatsCollector) -> RequestOutcome {
    if let Lookup::Found(value) = cache.get(key) {
        stats.record_hit();
        return RequestOutcome::found(value);
    }

    stats.record_miss();
    match store.get(key) {
        Ok(Lookup::Found(value)) => {
            cache.put(key, value.as_str());
            RequestOutcome::found(value)
        }
        Ok(Lookup::NotFound) => RequestOutcome::not_found(),
        Err(err) => {
            error!("GET failed for key '{}': {}", key, err);
            RequestOutcome::backend_error()
        }
    }
}

fn write(key: String, value: String, cache: &Cache, store: &mut dyn Store) -> RequestOutcome {
    if let Err(err) = store.put(&key, &value) {
        error!("PUT failed for key '{}': {}", key, err);
        return RequestOutcome::backend_error();
    }

    cache.put(key, value);
    RequestOutcome::ok()
}

fn delete(key: &str, cache: &Cache, store: &mut dyn Store) -> RequestOutcome {
    if let Err(err) = store.delete(key) {
        error!("DELETE failed for key '{}': {}", key, err);
        return RequestOutcome::backend_error();
    }

    cache.del(key);
    RequestOutcome::ok()
}
