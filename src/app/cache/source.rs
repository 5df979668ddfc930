//! Filesystem access seam
//!
//! Every stat, read check and directory listing the server performs goes
//! through a `MetadataSource`. The production implementation talks to the
//! real filesystem; tests substitute scripted sources to count calls and
//! inject failures. Implementations are blocking and are always invoked from
//! `spawn_blocking`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{FsError, FsResult};

use super::stats::FileStats;

/// Blocking filesystem operations used by the cache, verifier and prober
pub trait MetadataSource: Send + Sync + 'static {
    /// Look up metadata for a path (follows symlinks)
    fn stat(&self, path: &Path) -> FsResult<FileStats>;

    /// Check that the path can be opened for reading
    fn check_readable(&self, path: &Path) -> FsResult<()>;

    /// List the direct entries of a directory, sorted by name
    fn read_dir(&self, path: &Path) -> FsResult<Vec<PathBuf>>;
}

/// `MetadataSource` backed by the real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsMetadataSource;

impl MetadataSource for FsMetadataSource {
    fn stat(&self, path: &Path) -> FsResult<FileStats> {
        fs::metadata(path)
            .map(|metadata| FileStats::from_metadata(&metadata))
            .map_err(|e| FsError::from_io(path, &e))
    }

    fn check_readable(&self, path: &Path) -> FsResult<()> {
        let metadata = fs::metadata(path).map_err(|e| FsError::from_io(path, &e))?;

        let result = if metadata.is_dir() {
            fs::read_dir(path).map(|_| ())
        } else {
            fs::File::open(path).map(|_| ())
        };

        // A stat that succeeded followed by a failed open means no read access
        result.map_err(|e| match FsError::from_io(path, &e) {
            FsError::NotFound { path } => FsError::NotFound { path },
            FsError::Io { path, .. } | FsError::PermissionDenied { path } => {
                FsError::PermissionDenied { path }
            }
            other => other,
        })
    }

    fn read_dir(&self, path: &Path) -> FsResult<Vec<PathBuf>> {
        let entries = fs::read_dir(path).map_err(|e| FsError::from_io(path, &e))?;

        let mut paths: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stat_and_read_real_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.html");
        fs::write(&path, "<html></html>").unwrap();

        let source = FsMetadataSource;
        let stats = source.stat(&path).unwrap();
        assert_eq!(stats.size, 13);
        assert!(source.check_readable(&path).is_ok());
        assert!(source.check_readable(temp_dir.path()).is_ok());
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.js");

        let source = FsMetadataSource;
        assert!(matches!(source.stat(&path), Err(FsError::NotFound { .. })));
        assert!(matches!(
            source.check_readable(&path),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn test_read_dir_is_sorted() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["c.js", "a.css", "b.png"] {
            fs::write(temp_dir.path().join(name), "x").unwrap();
        }

        let entries = FsMetadataSource.read_dir(temp_dir.path()).unwrap();
        let names: Vec<_> = entries
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.css", "b.png", "c.js"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.txt");
        fs::write(&path, "x").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users ignore permission bits
        if fs::File::open(&path).is_ok() {
            return;
        }

        let source = FsMetadataSource;
        assert!(source.stat(&path).is_ok());
        assert!(matches!(
            source.check_readable(&path),
            Err(FsError::PermissionDenied { .. })
        ));
    }
}
