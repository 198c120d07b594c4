//! KV Cache Server - binary entry point
//!
//! Loads configuration, starts the server and waits for SIGINT/SIGTERM.

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kv_cache_server::backend::connector_from_url;
use kv_cache_server::{Config, Server, ShutdownHandle};

/// Main entry point for the KV cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Resolve the persistent store from `STORE_URL`
/// 4. Start workers and the HTTP acceptor
/// 5. Wait for a shutdown signal, then stop and report final stats
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kv_cache_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting KV Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, cache_size={}, workers={}, queue_depth={}, store={}, stats_interval={}s",
        config.server_port,
        config.cache_capacity,
        config.worker_threads,
        config.queue_depth,
        config.store_url,
        config.stats_interval
    );

    let connector = connector_from_url(&config.store_url)
        .with_context(|| format!("unusable store url '{}'", config.store_url))?;

    let shutdown = ShutdownHandle::new();
    let mut server = Server::new(config, connector, shutdown.clone());
    server.start().await.context("failed to start server")?;

    tokio::spawn(trigger_on_signal(shutdown.clone()));
    shutdown.wait().await;

    server.stop().await;
    info!("Server shutdown complete");

    Ok(())
}

/// Waits for Ctrl+C or SIGTERM and triggers shutdown.
async fn trigger_on_signal(shutdown: ShutdownHandle) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    shutdown.trigger();
}
