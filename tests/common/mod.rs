//! Shared fixtures for the integration tests
//!
//! Builds a small site in a temporary directory and runs the real server on
//! an ephemeral port.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use cubenav_server::app::access::AccessConfig;
use cubenav_server::app::cache::CacheConfig;
use cubenav_server::app::health::HealthConfig;
use cubenav_server::app::server::{AppState, Server, ServerConfig};
use cubenav_server::cli::verify_startup;
use cubenav_server::errors::ServerError;

pub const INDEX_HTML: &str = "<!doctype html><title>cube</title>";
pub const APP_JS: &str = "console.log('cube');";

/// A running server plus everything needed to inspect and stop it
pub struct TestServer {
    pub base_url: String,
    pub root: PathBuf,
    pub state: AppState,
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<Result<(), ServerError>>,
    _temp_dir: TempDir,
}

impl TestServer {
    /// Start a server over a fresh site
    pub async fn start() -> Self {
        Self::start_with(|server| server, |health| health).await
    }

    /// Start a server with adjusted server and health configuration
    pub async fn start_with<S, H>(adjust_server: S, adjust_health: H) -> Self
    where
        S: FnOnce(ServerConfig) -> ServerConfig,
        H: FnOnce(HealthConfig) -> HealthConfig,
    {
        let temp_dir = TempDir::new().unwrap();
        let root = create_site(&temp_dir);

        let server_config = adjust_server(
            ServerConfig::with_static_root(root.clone())
                .with_host("127.0.0.1")
                .with_port(0),
        );
        let health_config = adjust_health(
            HealthConfig::with_static_root(root.clone())
                .with_interval(Duration::from_secs(3600))
                .with_max_interval(Duration::from_secs(7200))
                .with_container_checks(false),
        );
        let state = AppState::from_config(
            server_config,
            CacheConfig::default(),
            AccessConfig::default().with_retry_delay(Duration::from_millis(5)),
            health_config,
        );

        verify_startup(&state).await.unwrap();

        let server = Server::bind(state.clone()).await.unwrap();
        let addr = server.local_addr().unwrap();

        let shutdown_tx = server.shutdown_sender();
        let handle = tokio::spawn(server.run_until_shutdown());

        Self {
            base_url: format!("http://{}", addr),
            root,
            state,
            shutdown_tx,
            handle,
            _temp_dir: temp_dir,
        }
    }

    /// Absolute URL for a request path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Broadcast shutdown and wait for the server to drain
    pub async fn stop(self) -> Result<(), ServerError> {
        let _ = self.shutdown_tx.send(());
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

/// Lay out `public/` with an entry document, an asset and a background
pub fn create_site(temp_dir: &TempDir) -> PathBuf {
    let root = temp_dir.path().join("public");
    fs::create_dir_all(root.join("backgrounds")).unwrap();
    fs::write(root.join("index.html"), INDEX_HTML).unwrap();
    fs::write(root.join("app.js"), APP_JS).unwrap();
    fs::write(root.join("backgrounds").join("bg.jpg"), [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
    root
}
