//! Retrying readability checks
//!
//! `AccessVerifier` answers one question, "can this path be served right
//! now?", with a bounded number of attempts and a constant pause between
//! them. It always resolves to an answer; errors are recorded in the path's
//! `AccessState` rather than returned.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::app::cache::{FileStats, StatsCache};
use crate::errors::{FsError, FsResult};

use super::config::AccessConfig;
use super::state::AccessState;

/// Verifies that paths exist and are readable, with retries
#[derive(Debug)]
pub struct AccessVerifier {
    /// Retry policy
    config: AccessConfig,
    /// Shared stats cache
    cache: Arc<StatsCache>,
    /// Last verification outcome per path
    states: RwLock<HashMap<PathBuf, AccessState>>,
}

impl AccessVerifier {
    /// Create a verifier on top of a shared stats cache
    pub fn new(config: AccessConfig, cache: Arc<StatsCache>) -> Self {
        Self {
            config,
            cache,
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Get the verifier configuration
    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// The stats cache consulted by this verifier
    pub fn cache(&self) -> &Arc<StatsCache> {
        &self.cache
    }

    /// Verify a path with up to `max_retries` attempts
    ///
    /// Returns `true` as soon as one attempt succeeds. A `max_retries` of
    /// zero still makes one attempt.
    pub async fn verify(&self, path: &Path, max_retries: u32) -> bool {
        self.verify_stats(path, max_retries).await.is_some()
    }

    /// Verify a path and return the stats that the successful attempt saw
    pub async fn verify_stats(&self, path: &Path, max_retries: u32) -> Option<FileStats> {
        self.verify_tracked(path, max_retries, true).await
    }

    /// Verify a path named by a client request
    ///
    /// Same as [`AccessVerifier::verify_stats`], except that a path which is
    /// missing and has never been tracked gets no state. Client routes and
    /// scanner noise would otherwise grow the state map without limit.
    pub async fn verify_request(&self, path: &Path, max_retries: u32) -> Option<FileStats> {
        self.verify_tracked(path, max_retries, false).await
    }

    async fn verify_tracked(
        &self,
        path: &Path,
        max_retries: u32,
        track_missing: bool,
    ) -> Option<FileStats> {
        let allowed = max_retries.max(1);
        let mut last_error: Option<FsError> = None;

        for attempt in 1..=allowed {
            match self.attempt(path, attempt).await {
                Ok(stats) => {
                    if attempt > 1 {
                        info!(
                            "Access to {} recovered on attempt {}/{}",
                            path.display(),
                            attempt,
                            allowed
                        );
                    }
                    self.record(AccessState::accessible(
                        path.to_path_buf(),
                        attempt,
                        last_error.map(|e| e.to_string()),
                    ))
                    .await;
                    return Some(stats);
                }
                Err(e) => {
                    debug!(
                        "Access check failed for {} (attempt {}/{}): {}",
                        path.display(),
                        attempt,
                        allowed,
                        e
                    );
                    last_error = Some(e);
                }
            }

            if attempt < allowed {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        // Missing paths are routine (client-side routes); anything else is not
        match &last_error {
            Some(FsError::NotFound { .. }) => debug!(
                "{} not found after {} attempts",
                path.display(),
                allowed
            ),
            Some(e) => warn!(
                "{} is not accessible after {} attempts: {}",
                path.display(),
                allowed,
                e
            ),
            None => {}
        }

        let missing = matches!(last_error, Some(FsError::NotFound { .. }));
        let state = AccessState::inaccessible(
            path.to_path_buf(),
            allowed,
            last_error.map(|e| e.to_string()),
        );
        if missing && !track_missing {
            self.update_existing(state).await;
        } else {
            self.record(state).await;
        }
        None
    }

    /// Last recorded state for a path
    pub async fn state(&self, path: &Path) -> Option<AccessState> {
        self.states.read().await.get(path).cloned()
    }

    /// All recorded states, sorted by path
    pub async fn snapshot(&self) -> Vec<AccessState> {
        let states = self.states.read().await;
        let mut all: Vec<AccessState> = states.values().cloned().collect();
        all.sort_by(|a, b| a.path.cmp(&b.path));
        all
    }

    /// Paths whose most recent verification failed, sorted
    pub async fn failed_paths(&self) -> Vec<PathBuf> {
        let states = self.states.read().await;
        let mut failed: Vec<PathBuf> = states
            .values()
            .filter(|state| !state.is_accessible)
            .map(|state| state.path.clone())
            .collect();
        failed.sort();
        failed
    }

    /// One stat followed by one read check
    ///
    /// The first attempt may be answered from the cache; later attempts
    /// always go to the filesystem so a stale entry cannot mask a recovery.
    async fn attempt(&self, path: &Path, attempt: u32) -> FsResult<FileStats> {
        let stats = if attempt == 1 {
            self.cache.get_or_refresh(path).await?
        } else {
            self.cache.refresh(path).await?
        };
        self.cache.check_readable(path).await?;
        Ok(stats)
    }

    async fn record(&self, state: AccessState) {
        let mut states = self.states.write().await;
        states.insert(state.path.clone(), state);
    }

    /// Overwrite a state only if the path is already tracked
    async fn update_existing(&self, state: AccessState) {
        let mut states = self.states.write().await;
        if let Some(existing) = states.get_mut(&state.path) {
            *existing = state;
        }
    }
}
