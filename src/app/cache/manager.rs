//! Time-bounded memoization of filesystem metadata
//!
//! `StatsCache` owns the only copy of cached metadata in the process. Request
//! handlers and the health prober share one instance through an `Arc`.
//! Entries are created lazily, overwritten on refresh and only ever removed
//! all at once by `clear`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::errors::{FsError, FsResult};

use super::config::CacheConfig;
use super::source::{FsMetadataSource, MetadataSource};
use super::stats::{CacheEntry, FileStats};

/// Shared cache of filesystem metadata keyed by path
pub struct StatsCache {
    /// Configuration
    config: CacheConfig,
    /// Where lookups go
    source: Arc<dyn MetadataSource>,
    /// Cached entries by path
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
    /// Number of metadata lookups issued to the source
    lookups: AtomicU64,
}

impl std::fmt::Debug for StatsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsCache")
            .field("config", &self.config)
            .field("lookups", &self.lookups.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl StatsCache {
    /// Create a cache backed by the real filesystem
    pub fn new(config: CacheConfig) -> Self {
        Self::with_source(config, Arc::new(FsMetadataSource))
    }

    /// Create a cache backed by a custom metadata source
    pub fn with_source(config: CacheConfig, source: Arc<dyn MetadataSource>) -> Self {
        debug!("Initialized stats cache with TTL {:?}", config.ttl);

        Self {
            config,
            source,
            entries: RwLock::new(HashMap::new()),
            lookups: AtomicU64::new(0),
        }
    }

    /// Get the cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Time-to-live applied to entries
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Return cached stats while fresh, otherwise look them up and cache them
    ///
    /// # Errors
    ///
    /// Returns `FsError::NotFound` or `FsError::PermissionDenied` when the
    /// lookup fails. Failures are not cached.
    pub async fn get_or_refresh(&self, path: &Path) -> FsResult<FileStats> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(path) {
                if entry.is_fresh(self.config.ttl) {
                    debug!("Stats cache hit: {}", path.display());
                    return Ok(entry.stats.clone());
                }
            }
        }

        debug!("Stats cache miss: {}", path.display());
        self.refresh(path).await
    }

    /// Look up stats unconditionally and overwrite any cached entry
    pub async fn refresh(&self, path: &Path) -> FsResult<FileStats> {
        let stats = self.lookup(path).await?;

        let mut entries = self.entries.write().await;
        entries.insert(
            path.to_path_buf(),
            CacheEntry::new(path.to_path_buf(), stats.clone()),
        );

        Ok(stats)
    }

    /// Fresh cached stats for a path, without touching the filesystem
    pub async fn peek(&self, path: &Path) -> Option<FileStats> {
        let entries = self.entries.read().await;
        entries
            .get(path)
            .filter(|entry| entry.is_fresh(self.config.ttl))
            .map(|entry| entry.stats.clone())
    }

    /// Drop every entry, returning how many were removed
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();

        info!("Cleared stats cache ({} entries)", removed);
        removed
    }

    /// Number of entries currently held, fresh or not
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Number of metadata lookups issued since creation
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Check read access to a path (never cached)
    pub async fn check_readable(&self, path: &Path) -> FsResult<()> {
        let source = Arc::clone(&self.source);
        run_blocking(path, move |p| source.check_readable(p)).await
    }

    /// List the direct entries of a directory (never cached)
    pub async fn read_dir(&self, path: &Path) -> FsResult<Vec<PathBuf>> {
        let source = Arc::clone(&self.source);
        run_blocking(path, move |p| source.read_dir(p)).await
    }

    async fn lookup(&self, path: &Path) -> FsResult<FileStats> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let source = Arc::clone(&self.source);
        run_blocking(path, move |p| source.stat(p)).await
    }
}

/// Run a blocking filesystem call off the async worker threads
async fn run_blocking<T, F>(path: &Path, call: F) -> FsResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Path) -> FsResult<T> + Send + 'static,
{
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || call(&owned))
        .await
        .unwrap_or_else(|e| {
            Err(FsError::Io {
                path: path.to_path_buf(),
                message: format!("filesystem task failed: {}", e),
            })
        })
}
