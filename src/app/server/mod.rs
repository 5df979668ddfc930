//! HTTP server for the single-page application
//!
//! Routes `/health` and `/favicon.ico`, sends every other GET or HEAD to the
//! static responder, attaches security headers to every response, and runs
//! the health probe alongside the listener until shutdown.
//!
//! # Architecture
//!
//! - [`config`] - Server configuration and deployment mode
//! - [`state`] - Shared components handed to handlers
//! - [`responder`] - Static files and the entry document fallback
//! - [`headers`] - Security headers, content types, conditional requests
//! - [`listing`] - Directory listings for `/health`
//! - [`routes`] - Handlers and request logging
//! - [`signals`] - CTRL-C and SIGTERM handling
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use cubenav_server::app::access::AccessConfig;
//! use cubenav_server::app::cache::CacheConfig;
//! use cubenav_server::app::health::HealthConfig;
//! use cubenav_server::app::server::{AppState, Server, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let root = PathBuf::from("public");
//! let state = AppState::from_config(
//!     ServerConfig::with_static_root(root.clone()).with_port(8080),
//!     CacheConfig::default(),
//!     AccessConfig::default(),
//!     HealthConfig::with_static_root(root),
//! );
//!
//! Server::bind(state).await?.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod headers;
pub mod listing;
pub mod responder;
pub mod routes;
pub mod signals;
pub mod state;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::app::health::BackgroundTaskManager;
use crate::constants::server;
use crate::errors::ServerError;

pub use config::{Environment, ServerConfig};
pub use listing::FileListing;
pub use responder::StaticResponder;
pub use routes::HealthResponse;
pub use signals::{create_shutdown_channel, wait_for_shutdown_signal, SignalHandler};
pub use state::AppState;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(server::HEALTH_PATH, get(routes::health))
        .route(server::FAVICON_PATH, get(routes::favicon))
        .fallback(routes::static_fallback)
        .layer(middleware::from_fn(routes::log_requests))
        .layer(middleware::from_fn(headers::security_headers))
        .with_state(state)
}

/// Bind a listener, separating "address in use" from other failures
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr).await.map_err(|e| {
        if e.kind() == io::ErrorKind::AddrInUse {
            ServerError::AddressInUse {
                addr: addr.to_string(),
            }
        } else {
            ServerError::Bind {
                addr: addr.to_string(),
                source: e,
            }
        }
    })
}

/// A bound server, ready to run
///
/// Shutdown receivers are subscribed at bind time, so a shutdown sent any
/// time after `bind` returns is seen by both the listener and the probe task.
pub struct Server {
    state: AppState,
    listener: TcpListener,
    shutdown_tx: broadcast::Sender<()>,
    listener_rx: broadcast::Receiver<()>,
    probe_rx: broadcast::Receiver<()>,
}

impl Server {
    /// Bind the configured address
    pub async fn bind(state: AppState) -> Result<Self, ServerError> {
        let addr = state
            .config
            .socket_addr()
            .map_err(ServerError::Internal)?;
        let listener = bind(addr).await?;

        let (shutdown_tx, listener_rx) = create_shutdown_channel();
        let probe_rx = shutdown_tx.subscribe();

        Ok(Self {
            state,
            listener,
            shutdown_tx,
            listener_rx,
            probe_rx,
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(ServerError::Serve)
    }

    /// Shared state served by this server
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Sender that stops this server when it broadcasts
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Serve until CTRL-C or SIGTERM
    pub async fn run(self) -> Result<(), ServerError> {
        let signal_task = SignalHandler::new(self.shutdown_sender()).setup();

        let result = self.run_until_shutdown().await;
        signal_task.abort();
        result
    }

    /// Serve until shutdown is broadcast on [`Server::shutdown_sender`]
    ///
    /// In-flight requests are drained before returning, then the probe task
    /// is stopped.
    pub async fn run_until_shutdown(self) -> Result<(), ServerError> {
        let addr = self.local_addr()?;
        let Self {
            state,
            listener,
            shutdown_tx,
            listener_rx,
            probe_rx,
        } = self;

        let mut tasks = BackgroundTaskManager::new();
        tasks.start_probe_task(Arc::clone(&state.prober), probe_rx);

        let app = build_router(state);

        info!("Serving on http://{}", addr);
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown_signal(listener_rx))
            .await
            .map_err(ServerError::Serve);

        // The listener may have stopped on its own; the probe task must too
        let _ = shutdown_tx.send(());
        tasks.shutdown_all().await;
        debug!("Server on {} stopped", addr);

        result
    }
}
