//! Core application logic for the cube navigation server
//!
//! This module contains the filesystem stats cache, retrying access
//! verification, the periodic health prober and the HTTP server that ties
//! them together.
//!
//! Request handlers and the probe task share one [`StatsCache`] and one
//! [`AccessVerifier`]; see [`server::AppState`] for the wiring.

pub mod access;
pub mod cache;
pub mod health;
pub mod server;

// Re-export main public API
pub use access::{AccessConfig, AccessState, AccessVerifier};
pub use cache::{CacheConfig, FileStats, FsMetadataSource, MetadataSource, StatsCache};
pub use health::{BackgroundTaskManager, HealthConfig, HealthProber, ProbeReport};
pub use server::{AppState, Environment, Server, ServerConfig, StaticResponder};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        // Defaults of every component validate
        assert!(CacheConfig::default().validate().is_ok());
        assert!(AccessConfig::default().validate().is_ok());
        assert!(HealthConfig::default().validate().is_ok());
        assert!(ServerConfig::default().validate().is_ok());
    }
}
