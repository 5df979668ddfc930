//! Prelude module for the cube navigation server library
//!
//! Re-exports the items needed to embed the server with a single
//! `use cubenav_server::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use cubenav_server::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let runtime = AppConfig::load(None).await?.to_runtime_config();
//!     runtime.validate()?;
//!
//!     let state = AppState::from_config(
//!         runtime.server,
//!         runtime.cache,
//!         runtime.access,
//!         runtime.health,
//!     );
//!     Server::bind(state).await?.run().await?;
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, FsError, Result};

// Configuration
pub use crate::config::{AppConfig, RuntimeConfig};

// Components
pub use crate::app::{
    AccessConfig, AccessVerifier, AppState, CacheConfig, Environment, HealthConfig,
    HealthProber, ProbeReport, Server, ServerConfig, StatsCache,
};
