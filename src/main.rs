//! SGo playground backend (v1)
//!
//! Serves the playground page and a WebSocket endpoint that formats,
//! translates and executes SGo programs.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser ──ws──▶ http::websocket ──Envelope──▶ dispatch::queue (global FIFO)
//!                          ▲                              │
//!                          │                              ▼
//!                     dispatch::writer ◀──Response── dispatch::worker
//!                                                         │
//!                                          resilience::supervise (fault boundary)
//!                                                         │
//!                               ┌─────────────────────────┼──────────────────┐
//!                               ▼                         ▼                  ▼
//!                        handlers::format       handlers::translate   handlers::execute
//!                               │                         │                  │
//!                               ▼                         ▼                  ▼
//!                        toolchain (gofmt)        toolchain (sgo)      execution::proxy
//!                                                                     (remote compile)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use sgo_playground::config::{load_config, ConfigWatcher};
use sgo_playground::lifecycle::Shutdown;
use sgo_playground::observability::{logging, metrics};
use sgo_playground::resilience::supervise::install_panic_hook;
use sgo_playground::{HttpServer, PlaygroundConfig};

/// SGo playground server.
#[derive(Parser, Debug)]
#[command(name = "sgo-playground", version, about)]
struct Args {
    /// Path to a TOML configuration file; it is watched for changes.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration.
    #[arg(long)]
    http: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => PlaygroundConfig::default(),
    };
    if let Some(address) = &args.http {
        config.listener.bind_address = address.clone();
    }

    logging::init_logging(&config.observability.log_level);
    install_panic_hook();

    tracing::info!("sgo-playground v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        execution_endpoint = %config.execution.endpoint,
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // Hot reload; the watcher must outlive the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.clone());
            (Some(watcher.with_bind_override(args.http.clone()).run()?), updates)
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    HttpServer::new(config).run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
