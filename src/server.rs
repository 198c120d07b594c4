//! Server lifecycle
//!
//! Wires the cache, the stats collector, the worker pool and the HTTP
//! acceptor together, and tears them down in order on shutdown.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::api::{create_router, AppState};
use crate::backend::StoreConnector;
use crate::cache::{Cache, StatsCollector, StatsSnapshot};
use crate::config::Config;
use crate::dispatch::WorkerPool;
use crate::error::{Result, ServerError};
use crate::tasks::spawn_stats_reporter;

// == Shutdown Handle ==
/// Cloneable shutdown signal.
///
/// Signal handlers, tests and embedding code all trigger shutdown through
/// this handle instead of reaching into the server.
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Requests shutdown. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once shutdown has been requested.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

// == Lifecycle ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Stopped,
    Running,
    Stopping,
}

/// Everything owned by a started server.
struct RunningServer {
    addr: SocketAddr,
    pool: WorkerPool,
    stats: Arc<StatsCollector>,
    serve: JoinHandle<io::Result<()>>,
    stop_acceptor: oneshot::Sender<()>,
    reporter: Option<JoinHandle<()>>,
}

// == Server ==
/// The key-value server.
///
/// `start` brings up workers (each with its own store connection) before the
/// listener accepts anything; `stop` stops the acceptor, drains the queue,
/// joins the workers and reports final stats.
pub struct Server {
    config: Config,
    connector: Arc<dyn StoreConnector>,
    shutdown: ShutdownHandle,
    state: Lifecycle,
    running: Option<RunningServer>,
}

impl Server {
    pub fn new(config: Config, connector: Arc<dyn StoreConnector>, shutdown: ShutdownHandle) -> Self {
        Self {
            config,
            connector,
            shutdown,
            state: Lifecycle::Stopped,
            running: None,
        }
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// Address the acceptor is bound to, while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.addr)
    }

    /// Current counters, while running.
    pub fn stats(&self) -> Option<StatsSnapshot> {
        self.running.as_ref().map(|running| running.stats.snapshot())
    }

    /// Binds the listener, spawns the worker pool and starts accepting.
    ///
    /// On failure nothing is left running and the server stays `Stopped`.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if self.state != Lifecycle::Stopped {
            return Err(ServerError::AlreadyRunning);
        }
        self.config.validate()?;
        if self.shutdown.is_triggered() {
            return Err(ServerError::ShutdownRequested);
        }

        let bind_addr = self.config.listen_addr();
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: bind_addr,
                source,
            })?;
        let addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: bind_addr,
            source,
        })?;

        let cache = Arc::new(Cache::new(self.config.cache_capacity));
        let stats = Arc::new(StatsCollector::new());

        // Store connections may block, so the pool is brought up off the runtime
        let pool = {
            let connector = Arc::clone(&self.connector);
            let cache = Arc::clone(&cache);
            let stats = Arc::clone(&stats);
            let (workers, depth) = (self.config.worker_threads, self.config.queue_depth);
            tokio::task::spawn_blocking(move || {
                WorkerPool::spawn(workers, depth, connector.as_ref(), cache, stats)
            })
            .await
            .map_err(|err| ServerError::Spawn(io::Error::new(io::ErrorKind::Other, err)))??
        };

        let app = create_router(AppState::new(pool.dispatcher(), Arc::clone(&stats), cache));

        let (stop_acceptor, stop_rx) = oneshot::channel::<()>();
        let external = self.shutdown.clone();
        let serve = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    tokio::select! {
                        _ = external.wait() => {}
                        _ = stop_rx => {}
                    }
                })
                .await
        });

        let reporter = (self.config.stats_interval > 0)
            .then(|| spawn_stats_reporter(Arc::clone(&stats), self.config.stats_interval));

        info!("Server listening on http://{}", addr);

        self.running = Some(RunningServer {
            addr,
            pool,
            stats,
            serve,
            stop_acceptor,
            reporter,
        });
        self.state = Lifecycle::Running;

        Ok(addr)
    }

    /// Stops the server and returns the final counters.
    ///
    /// Returns `None` if the server was not running.
    pub async fn stop(&mut self) -> Option<StatsSnapshot> {
        let running = self.running.take()?;
        self.state = Lifecycle::Stopping;
        info!("Stopping server on {}", running.addr);

        // Stop accepting; in-flight HTTP requests finish first
        let _ = running.stop_acceptor.send(());
        match running.serve.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!("Acceptor terminated with error: {}", err),
            Err(err) => error!("Acceptor task failed: {}", err),
        }

        // Drain queued jobs and release every store connection
        let pool = running.pool;
        if let Err(err) = tokio::task::spawn_blocking(move || pool.join()).await {
            warn!("Worker pool shutdown failed: {}", err);
        }

        if let Some(reporter) = running.reporter {
            reporter.abort();
        }

        let snapshot = running.stats.snapshot();
        info!(
            total_requests = snapshot.total_requests,
            cache_hits = snapshot.cache_hits,
            cache_misses = snapshot.cache_misses,
            hit_rate = snapshot.hit_rate,
            "Server stopped"
        );

        self.state = Lifecycle::Stopped;
        Some(snapshot)
    }
}
