//! Probe reports
//!
//! A `ProbeReport` is produced fresh by every probe run and never persisted.
//! The most recent one is kept by the prober for `/health` and `check`.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::cache::FileStats;

use super::container::ContainerSignals;

/// Status of a required directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryStatus {
    /// Whether the path exists
    pub exists: bool,
    /// Whether the path is a directory
    pub is_directory: bool,
    /// Permission bits as an octal string
    pub permissions: Option<String>,
}

impl DirectoryStatus {
    /// Status for a path that could not be stat'ed
    pub fn missing() -> Self {
        Self {
            exists: false,
            is_directory: false,
            permissions: None,
        }
    }

    /// Status built from stats
    pub fn from_stats(stats: &FileStats) -> Self {
        Self {
            exists: true,
            is_directory: stats.is_directory,
            permissions: Some(stats.permissions_octal()),
        }
    }

    /// Whether the directory requirement is met
    pub fn is_ok(&self) -> bool {
        self.exists && self.is_directory
    }
}

/// Status of one walked entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    /// Whether the entry passed access verification
    pub is_accessible: bool,
    /// Size in bytes, when known
    pub size: Option<u64>,
}

/// Result of one probe run
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    /// When the probe started
    pub timestamp: DateTime<Utc>,
    /// Aggregate verdict
    pub healthy: bool,
    /// Required directories by path
    pub directories: BTreeMap<String, DirectoryStatus>,
    /// Walked entries by path
    pub files: BTreeMap<String, FileStatus>,
    /// Problems found during the run
    pub errors: Vec<String>,
    /// Paths that failed the main pass but passed the recovery pass
    pub recovered: Vec<String>,
    /// Container signals, when container checks are enabled
    pub container: Option<ContainerSignals>,
    /// Wall time of the run
    pub duration_ms: u64,
}

impl ProbeReport {
    /// Create an empty report stamped now
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            healthy: true,
            directories: BTreeMap::new(),
            files: BTreeMap::new(),
            errors: Vec::new(),
            recovered: Vec::new(),
            container: None,
            duration_ms: 0,
        }
    }

    /// Record a problem and mark the report unhealthy
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.healthy = false;
        self.errors.push(message.into());
    }

    /// Whether the probe passed
    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    /// Entries that were not accessible at the end of the run
    pub fn inaccessible_files(&self) -> Vec<&str> {
        self.files
            .iter()
            .filter(|(_, status)| !status.is_accessible)
            .map(|(path, _)| path.as_str())
            .collect()
    }

    /// Set the wall time of the run
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_ms = duration.as_millis() as u64;
    }
}

impl Default for ProbeReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report_is_healthy() {
        let report = ProbeReport::new();
        assert!(report.is_healthy());
        assert!(report.errors.is_empty());
        assert!(report.inaccessible_files().is_empty());
    }

    #[test]
    fn test_error_marks_unhealthy() {
        let mut report = ProbeReport::new();
        report.files.insert(
            "public/app.js".to_string(),
            FileStatus {
                is_accessible: false,
                size: None,
            },
        );
        report.add_error("public/app.js is not accessible");

        assert!(!report.is_healthy());
        assert_eq!(report.inaccessible_files(), vec!["public/app.js"]);
    }

    #[test]
    fn test_directory_status() {
        assert!(!DirectoryStatus::missing().is_ok());

        let stats = FileStats {
            size: 4096,
            mode: 0o755,
            is_directory: true,
            modified: None,
        };
        let status = DirectoryStatus::from_stats(&stats);
        assert!(status.is_ok());
        assert_eq!(status.permissions.as_deref(), Some("755"));
    }

    #[test]
    fn test_report_serializes() {
        let mut report = ProbeReport::new();
        report.set_duration(Duration::from_millis(12));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["healthy"], true);
        assert_eq!(json["duration_ms"], 12);
        assert!(json["container"].is_null());
    }
}
