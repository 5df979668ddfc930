//! Startup verification for the cube navigation server
//!
//! The server refuses to start in a broken state: the static root, every
//! required subdirectory and the entry document must be usable before the
//! listener is bound. One health probe then seeds `/health` and the probe
//! schedule.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::app::cache::StatsCache;
use crate::app::health::ProbeReport;
use crate::app::server::AppState;
use crate::errors::{FsError, FsResult, StartupError};

/// Check the static layout, then run the first health probe
///
/// Layout problems are fatal; an unhealthy first probe is only logged,
/// because the periodic probe keeps retrying it.
pub async fn verify_startup(state: &AppState) -> Result<ProbeReport, StartupError> {
    let config = &state.config;
    let cache = &state.cache;

    info!(
        "Verifying static root {} ({} mode)",
        config.static_root.display(),
        config.environment
    );

    require_directory(cache, &config.static_root)
        .await
        .map_err(StartupError::StaticRoot)?;

    for subdir in state.prober.config().required_dirs() {
        require_directory(cache, &subdir)
            .await
            .map_err(StartupError::RequiredDirectory)?;
    }

    let entry = config.entry_document_path();
    require_readable_file(cache, &entry)
        .await
        .map_err(StartupError::EntryDocument)?;
    debug!("Entry document {} is readable", entry.display());

    let report = state.prober.probe().await;
    if report.is_healthy() {
        info!(
            "Initial health probe passed: {} entries checked",
            report.files.len()
        );
    } else {
        warn!(
            "Initial health probe found problems: {}",
            report.errors.join("; ")
        );
    }

    Ok(report)
}

/// Path must exist and be a directory
async fn require_directory(cache: &StatsCache, path: &Path) -> FsResult<()> {
    let stats = cache.refresh(path).await?;
    if !stats.is_directory {
        return Err(FsError::DirectoryExpected {
            path: path.to_path_buf(),
        });
    }
    cache.check_readable(path).await
}

/// Path must exist, be a file and be readable
async fn require_readable_file(cache: &StatsCache, path: &Path) -> FsResult<()> {
    let stats = cache.refresh(path).await?;
    if stats.is_directory {
        return Err(FsError::Io {
            path: path.to_path_buf(),
            message: "expected a file, found a directory".to_string(),
        });
    }
    cache.check_readable(path).await
}
