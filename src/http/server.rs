//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeouts)
//! - Start the dispatch worker and feed it configuration reloads
//! - Bind server to listener, plain or TLS
//! - Stop everything on the shutdown signal

use axum::{routing::get, Router};
use arc_swap::ArcSwap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ListenerConfig, PlaygroundConfig};
use crate::dispatch::{queue, DispatchQueue, Worker};
use crate::execution::{ExecutionProxy, ProxyError};
use crate::handlers::Handlers;
use crate::http::page::{index_handler, status_handler};
use crate::http::websocket::ws_handler;
use crate::net::tls::load_tls_config;
use crate::net::ConnectionTracker;
use crate::toolchain::Toolchain;

/// How long in-flight work may take to finish after shutdown is signalled.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that prevent the server from starting or keep it from serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("execution proxy setup failed: {0}")]
    Proxy(#[from] ProxyError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub queue: DispatchQueue,
    pub connections: ConnectionTracker,
    pub max_message_bytes: usize,
    /// Whether the page should link a `wss://` endpoint.
    pub secure: bool,
}

/// HTTP server for the playground.
pub struct HttpServer {
    config: PlaygroundConfig,
    toolchain: Option<Arc<dyn Toolchain>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: PlaygroundConfig) -> Self {
        Self {
            config,
            toolchain: None,
        }
    }

    /// Use `toolchain` instead of the configured commands, across reloads too.
    pub fn with_toolchain(mut self, toolchain: Arc<dyn Toolchain>) -> Self {
        self.toolchain = Some(toolchain);
        self
    }

    fn build_handlers(
        config: &PlaygroundConfig,
        toolchain: &Option<Arc<dyn Toolchain>>,
    ) -> Result<Handlers, ProxyError> {
        match toolchain {
            Some(toolchain) => Ok(Handlers::new(
                Arc::clone(toolchain),
                ExecutionProxy::new(&config.execution)?,
            )
            .with_toolchain_timeout(config.toolchain.timeout_secs)),
            None => Handlers::from_config(config),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &ListenerConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(index_handler))
            .route("/status", get(status_handler))
            .route("/ws", get(ws_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configurations arriving on `config_updates` replace the handlers used
    /// for subsequent requests. Returns once `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<PlaygroundConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        let handlers = Arc::new(ArcSwap::from_pointee(Self::build_handlers(
            &self.config,
            &self.toolchain,
        )?));

        // Dispatch worker
        let (queue, receiver) = queue::channel(self.config.dispatch.queue_warn_depth);
        let worker = Worker::new(receiver, Arc::clone(&handlers));
        let worker_task = tokio::spawn(worker.run(shutdown.resubscribe()));

        // Configuration reloads
        let reload_task = {
            let handlers = Arc::clone(&handlers);
            let queue = queue.clone();
            let toolchain = self.toolchain.clone();
            let listener_config = self.config.listener.clone();
            tokio::spawn(async move {
                while let Some(new_config) = config_updates.recv().await {
                    if new_config.listener != listener_config {
                        tracing::warn!("Listener settings changed; they take effect after a restart");
                    }
                    match Self::build_handlers(&new_config, &toolchain) {
                        Ok(new_handlers) => {
                            handlers.store(Arc::new(new_handlers));
                            queue.set_warn_depth(new_config.dispatch.queue_warn_depth);
                            tracing::info!(
                                endpoint = %new_config.execution.endpoint,
                                timeout_secs = new_config.execution.timeout_secs,
                                "Configuration reloaded"
                            );
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Rejected configuration reload");
                        }
                    }
                }
            })
        };

        let state = AppState {
            queue,
            connections: ConnectionTracker::new(self.config.listener.max_connections),
            max_message_bytes: self.config.listener.max_message_bytes,
            secure: self.config.listener.tls.is_some(),
        };
        let app = Self::build_router(&self.config.listener, state)
            .into_make_service_with_connect_info::<SocketAddr>();

        match &self.config.listener.tls {
            Some(tls) => {
                let rustls = load_tls_config(tls).await?;
                let handle = axum_server::Handle::new();
                let shutdown_handle = handle.clone();
                tokio::spawn(async move {
                    let _ = shutdown.recv().await;
                    tracing::info!("Shutdown signal received");
                    shutdown_handle.graceful_shutdown(Some(DRAIN_TIMEOUT));
                });

                tracing::info!(address = %addr, "HTTPS server starting");
                axum_server::from_tcp_rustls(listener.into_std()?, rustls)
                    .handle(handle)
                    .serve(app)
                    .await?;
            }
            None => {
                tracing::info!(address = %addr, "HTTP server starting");
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown.recv().await;
                        tracing::info!("Shutdown signal received");
                    })
                    .await?;
            }
        }

        reload_task.abort();
        if tokio::time::timeout(DRAIN_TIMEOUT, worker_task).await.is_err() {
            tracing::warn!("Dispatch worker did not stop in time");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &PlaygroundConfig {
        &self.config
    }
}
