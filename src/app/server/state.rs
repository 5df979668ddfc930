//! Shared state handed to every request handler

use std::sync::Arc;
use std::time::Instant;

use crate::app::access::{AccessConfig, AccessVerifier};
use crate::app::cache::{CacheConfig, StatsCache};
use crate::app::health::{HealthConfig, HealthProber};

use super::config::ServerConfig;
use super::responder::StaticResponder;

/// Components shared by handlers and the probe task
///
/// Cloning is cheap; every component sits behind an `Arc`, so the prober and
/// request handlers see the same cache and access states.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Stats cache
    pub cache: Arc<StatsCache>,
    /// Access verifier
    pub verifier: Arc<AccessVerifier>,
    /// Health prober
    pub prober: Arc<HealthProber>,
    /// Static file responder
    pub responder: Arc<StaticResponder>,
    /// Process start, for uptime
    pub started_at: Instant,
}

impl AppState {
    /// Wire all components from their runtime configurations
    pub fn from_config(
        server: ServerConfig,
        cache: CacheConfig,
        access: AccessConfig,
        health: HealthConfig,
    ) -> Self {
        let cache = Arc::new(StatsCache::new(cache));
        Self::with_cache(server, cache, access, health)
    }

    /// Wire all components around an existing stats cache
    pub fn with_cache(
        server: ServerConfig,
        cache: Arc<StatsCache>,
        access: AccessConfig,
        health: HealthConfig,
    ) -> Self {
        let verifier = Arc::new(AccessVerifier::new(access, Arc::clone(&cache)));
        let prober = Arc::new(HealthProber::new(
            health,
            Arc::clone(&cache),
            Arc::clone(&verifier),
        ));
        let responder = Arc::new(StaticResponder::new(&server, Arc::clone(&verifier)));

        Self {
            config: Arc::new(server),
            cache,
            verifier,
            prober,
            responder,
            started_at: Instant::now(),
        }
    }
}
