//! Directory listings reported by `/health`

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::app::access::AccessVerifier;
use crate::errors::FsResult;

/// One entry of a listed directory
#[derive(Debug, Clone, Serialize)]
pub struct FileListing {
    /// File name within the directory
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Permission bits as an octal string
    pub permissions: String,
    /// Whether the entry is a directory
    pub is_directory: bool,
    /// Whether the entry passed access verification
    pub accessible: bool,
    /// When accessibility was last checked
    pub last_checked: DateTime<Utc>,
}

/// List a directory through the shared cache and verifier
///
/// Each entry gets a single verification attempt; a listing is a snapshot,
/// not a recovery pass. Entries whose metadata cannot be read are reported
/// with zero size and no permissions.
pub async fn list_directory(verifier: &AccessVerifier, dir: &Path) -> FsResult<Vec<FileListing>> {
    let cache = verifier.cache();
    let entries = cache.read_dir(dir).await?;
    let mut listings = Vec::with_capacity(entries.len());

    for path in entries {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let accessible = verifier.verify(&path, 1).await;
        let last_checked = verifier
            .state(&path)
            .await
            .map(|state| state.last_checked_at)
            .unwrap_or_else(Utc::now);

        let listing = match cache.get_or_refresh(&path).await {
            Ok(stats) => FileListing {
                name,
                size: stats.size,
                permissions: stats.permissions_octal(),
                is_directory: stats.is_directory,
                accessible,
                last_checked,
            },
            Err(e) => {
                debug!("No metadata for listed entry {}: {}", path.display(), e);
                FileListing {
                    name,
                    size: 0,
                    permissions: String::new(),
                    is_directory: false,
                    accessible: false,
                    last_checked,
                }
            }
        };
        listings.push(listing);
    }

    Ok(listings)
}
