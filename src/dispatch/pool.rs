//! Worker pool management.
//!
//! A single acceptor feeds a bounded job queue; a fixed set of OS threads
//! drains it. Each worker owns one store connection for its whole life.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::backend::{Store, StoreConnector};
use crate::cache::{Cache, StatsCollector};
use crate::dispatch::{dispatch, Operation, RequestOutcome};
use crate::error::{DispatchError, ServerError};

/// An operation plus the channel its outcome is returned on.
struct Job {
    op: Operation,
    reply: oneshot::Sender<RequestOutcome>,
}

type JobQueue = Arc<Mutex<mpsc::Receiver<Job>>>;

// == Dispatcher ==
/// Cloneable submission handle for the worker pool.
///
/// Submitting waits for queue space when the pool is saturated, which is
/// the backpressure applied to the acceptor.
#[derive(Clone)]
pub struct Dispatcher {
    sender: Arc<Mutex<Option<mpsc::Sender<Job>>>>,
}

impl Dispatcher {
    /// Queues `op` and waits for a worker to produce its outcome.
    pub async fn submit(&self, op: Operation) -> Result<RequestOutcome, DispatchError> {
        let sender = self.sender.lock().clone().ok_or(DispatchError::Closed)?;
        let (reply, outcome) = oneshot::channel();

        sender
            .send(Job { op, reply })
            .await
            .map_err(|_| DispatchError::Closed)?;
        drop(sender);

        outcome.await.map_err(|_| DispatchError::Closed)
    }

    /// Stops accepting new operations. Queued and in-flight jobs still run.
    pub fn close(&self) {
        if self.sender.lock().take().is_some() {
            debug!("Dispatcher closed to new operations");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }
}

// == Worker Pool ==
struct Worker {
    id: usize,
    handle: JoinHandle<()>,
}

/// Fixed-size pool of dispatch workers.
pub struct WorkerPool {
    workers: Vec<Worker>,
    dispatcher: Dispatcher,
}

impl WorkerPool {
    /// Spawns `size` workers sharing a queue of `queue_depth` jobs.
    ///
    /// Each worker gets its own connection from `connector`. If any
    /// connection or thread fails, workers already started are shut down
    /// and the error is returned.
    pub fn spawn(
        size: usize,
        queue_depth: usize,
        connector: &dyn StoreConnector,
        cache: Arc<Cache>,
        stats: Arc<StatsCollector>,
    ) -> Result<Self, ServerError> {
        if size == 0 || queue_depth == 0 {
            return Err(ServerError::InvalidConfig(
                "worker pool size and queue depth must be positive".to_string(),
            ));
        }

        let (sender, receiver) = mpsc::channel(queue_depth);
        let queue: JobQueue = Arc::new(Mutex::new(receiver));
        let mut workers = Vec::with_capacity(size);

        for id in 0..size {
            match Self::spawn_worker(id, connector, &queue, &cache, &stats) {
                Ok(worker) => workers.push(worker),
                Err(err) => {
                    warn!("Worker {} failed to start: {}", id, err);
                    drop(sender);
                    join_all(workers);
                    return Err(err);
                }
            }
        }

        info!(
            "Started {} workers against {} (queue depth {})",
            size,
            connector.describe(),
            queue_depth
        );

        Ok(Self {
            workers,
            dispatcher: Dispatcher {
                sender: Arc::new(Mutex::new(Some(sender))),
            },
        })
    }

    fn spawn_worker(
        id: usize,
        connector: &dyn StoreConnector,
        queue: &JobQueue,
        cache: &Arc<Cache>,
        stats: &Arc<StatsCollector>,
    ) -> Result<Worker, ServerError> {
        let store = connector.connect()?;
        let queue = Arc::clone(queue);
        let cache = Arc::clone(cache);
        let stats = Arc::clone(stats);

        let handle = thread::Builder::new()
            .name(format!("kv-worker-{}", id))
            .spawn(move || run_worker(id, queue, store, cache, stats))
            .map_err(ServerError::Spawn)?;

        Ok(Worker { id, handle })
    }

    /// Returns a submission handle.
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Closes the queue, lets workers drain it, and waits for every worker
    /// to exit and release its store connection. Blocks the calling thread.
    pub fn join(self) {
        self.dispatcher.close();
        join_all(self.workers);
        info!("All workers stopped");
    }
}

fn join_all(workers: Vec<Worker>) {
    for worker in workers {
        if worker.handle.join().is_err() {
            warn!("Worker {} panicked", worker.id);
        }
    }
}

fn run_worker(
    id: usize,
    queue: JobQueue,
    mut store: Box<dyn Store>,
    cache: Arc<Cache>,
    stats: Arc<StatsCollector>,
) {
    debug!("Worker {} started", id);

    loop {
        // The queue lock is released before the job runs
        let job = queue.lock().blocking_recv();
        let Some(Job { op, reply }) = job else {
            break;
        };

        let outcome = dispatch(op, &cache, store.as_mut(), &stats);
        if reply.send(outcome).is_err() {
            debug!("Worker {}: requester dropped before reply", id);
        }
    }

    drop(store);
    debug!("Worker {} stopped, store connection released", id);
}
