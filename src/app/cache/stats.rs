//! File metadata snapshots held by the stats cache
//!
//! `FileStats` is the subset of filesystem metadata the server cares about.
//! `CacheEntry` pairs it with the instant it was captured so the cache can
//! enforce its time-to-live.

use std::fs::Metadata;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Utc};

/// Metadata captured for a single path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStats {
    /// Size in bytes
    pub size: u64,
    /// Permission bits (lower 12 bits of the mode)
    pub mode: u32,
    /// Whether the path is a directory
    pub is_directory: bool,
    /// Last modification time, when the platform reports one
    pub modified: Option<SystemTime>,
}

impl FileStats {
    /// Build stats from filesystem metadata
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            size: metadata.len(),
            mode: permission_bits(metadata),
            is_directory: metadata.is_dir(),
            modified: metadata.modified().ok(),
        }
    }

    /// Whether the path is a regular file (or anything that isn't a directory)
    pub fn is_file(&self) -> bool {
        !self.is_directory
    }

    /// Permission bits rendered as an octal string, e.g. `644`
    pub fn permissions_octal(&self) -> String {
        format!("{:o}", self.mode & 0o7777)
    }

    /// Modification time in UTC
    pub fn modified_utc(&self) -> Option<DateTime<Utc>> {
        self.modified.map(DateTime::<Utc>::from)
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata) -> u32 {
    let base = if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    };
    if metadata.is_dir() {
        base | 0o111
    } else {
        base
    }
}

/// A cached metadata lookup
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Path the stats belong to
    pub path: PathBuf,
    /// Captured metadata
    pub stats: FileStats,
    /// When the lookup happened
    pub captured_at: Instant,
}

impl CacheEntry {
    /// Create an entry captured now
    pub fn new(path: PathBuf, stats: FileStats) -> Self {
        Self {
            path,
            stats,
            captured_at: Instant::now(),
        }
    }

    /// Age of the entry
    pub fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }

    /// An entry is fresh while its age is strictly below the TTL
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats() -> FileStats {
        FileStats {
            size: 12,
            mode: 0o644,
            is_directory: false,
            modified: Some(SystemTime::UNIX_EPOCH),
        }
    }

    #[test]
    fn test_permissions_octal() {
        assert_eq!(sample_stats().permissions_octal(), "644");

        let dir = FileStats {
            mode: 0o755,
            is_directory: true,
            ..sample_stats()
        };
        assert_eq!(dir.permissions_octal(), "755");
        assert!(!dir.is_file());
    }

    #[test]
    fn test_entry_freshness() {
        let entry = CacheEntry::new(PathBuf::from("/tmp/a"), sample_stats());
        assert!(entry.is_fresh(Duration::from_secs(60)));
        assert!(!entry.is_fresh(Duration::ZERO));
    }

    #[test]
    fn test_from_real_metadata() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("file.txt");
        std::fs::write(&path, b"hello").unwrap();

        let stats = FileStats::from_metadata(&std::fs::metadata(&path).unwrap());
        assert_eq!(stats.size, 5);
        assert!(stats.is_file());
        assert!(stats.modified_utc().is_some());

        let dir_stats = FileStats::from_metadata(&std::fs::metadata(temp_dir.path()).unwrap());
        assert!(dir_stats.is_directory);
    }
}
