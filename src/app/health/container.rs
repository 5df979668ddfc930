//! Container environment detection
//!
//! Rudimentary signals that the server runs inside a container: marker
//! files, orchestrator environment variables, cgroup hints, and changes to
//! the mount table between probes. Only a mount table change affects health;
//! the rest is reported for diagnostics.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, warn};

use crate::constants::health;

/// Signals gathered by one observation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerSignals {
    /// Marker files that exist
    pub marker_files: Vec<String>,
    /// Orchestrator environment variables that are set
    pub orchestrator_env: Vec<String>,
    /// Whether the cgroup file mentions a container runtime
    pub cgroup_hint: bool,
    /// Fingerprint of the mount table, when readable
    pub mount_fingerprint: Option<String>,
    /// Whether the mount table changed since the previous observation
    pub mount_table_changed: bool,
}

impl ContainerSignals {
    /// Whether any signal points at a container runtime
    pub fn in_container(&self) -> bool {
        !self.marker_files.is_empty() || !self.orchestrator_env.is_empty() || self.cgroup_hint
    }
}

/// Observes container signals, remembering the last mount table fingerprint
#[derive(Debug)]
pub struct ContainerDetector {
    marker_files: Vec<PathBuf>,
    env_vars: Vec<String>,
    cgroup_path: PathBuf,
    mountinfo_path: PathBuf,
    last_fingerprint: Mutex<Option<String>>,
}

impl Default for ContainerDetector {
    fn default() -> Self {
        Self {
            marker_files: health::CONTAINER_MARKER_FILES
                .iter()
                .map(PathBuf::from)
                .collect(),
            env_vars: health::ORCHESTRATOR_ENV_VARS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            cgroup_path: PathBuf::from(health::CGROUP_PATH),
            mountinfo_path: PathBuf::from(health::MOUNTINFO_PATH),
            last_fingerprint: Mutex::new(None),
        }
    }
}

impl ContainerDetector {
    /// Detector using the standard locations
    pub fn new() -> Self {
        Self::default()
    }

    /// Detector with custom probe locations
    pub fn with_paths(
        marker_files: Vec<PathBuf>,
        env_vars: Vec<String>,
        cgroup_path: PathBuf,
        mountinfo_path: PathBuf,
    ) -> Self {
        Self {
            marker_files,
            env_vars,
            cgroup_path,
            mountinfo_path,
            last_fingerprint: Mutex::new(None),
        }
    }

    /// Gather signals (blocking)
    pub fn observe(&self) -> ContainerSignals {
        let marker_files = self
            .marker_files
            .iter()
            .filter(|path| path.exists())
            .map(|path| path.display().to_string())
            .collect();

        let orchestrator_env = self
            .env_vars
            .iter()
            .filter(|name| std::env::var_os(name).is_some())
            .cloned()
            .collect();

        let cgroup_hint = fs::read_to_string(&self.cgroup_path)
            .map(|content| health::CGROUP_HINTS.iter().any(|hint| content.contains(hint)))
            .unwrap_or(false);

        let mount_fingerprint = fs::read(&self.mountinfo_path)
            .ok()
            .map(|content| format!("{:x}", md5::compute(content)));

        let mount_table_changed = self.track_fingerprint(mount_fingerprint.as_deref());

        ContainerSignals {
            marker_files,
            orchestrator_env,
            cgroup_hint,
            mount_fingerprint,
            mount_table_changed,
        }
    }

    /// Store the new fingerprint and report whether it differs from the last one
    fn track_fingerprint(&self, fingerprint: Option<&str>) -> bool {
        let mut last = match self.last_fingerprint.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let changed = match (last.as_deref(), fingerprint) {
            (Some(previous), Some(current)) => previous != current,
            _ => false,
        };

        if changed {
            warn!("Mount table changed since last probe");
        } else {
            debug!("Mount table unchanged");
        }

        if let Some(current) = fingerprint {
            *last = Some(current.to_string());
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn detector_in(temp_dir: &TempDir, env_var: &str) -> ContainerDetector {
        ContainerDetector::with_paths(
            vec![temp_dir.path().join(".dockerenv")],
            vec![env_var.to_string()],
            temp_dir.path().join("cgroup"),
            temp_dir.path().join("mountinfo"),
        )
    }

    #[test]
    fn test_no_signals_outside_container() {
        let temp_dir = TempDir::new().unwrap();
        let detector = detector_in(&temp_dir, "CUBENAV_TEST_UNSET_ORCHESTRATOR");

        let signals = detector.observe();
        assert!(!signals.in_container());
        assert!(signals.mount_fingerprint.is_none());
        assert!(!signals.mount_table_changed);
    }

    #[test]
    fn test_marker_file_and_cgroup_hint() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".dockerenv"), "").unwrap();
        fs::write(
            temp_dir.path().join("cgroup"),
            "0::/kubepods/besteffort/pod1234",
        )
        .unwrap();
        let detector = detector_in(&temp_dir, "CUBENAV_TEST_UNSET_ORCHESTRATOR");

        let signals = detector.observe();
        assert!(signals.in_container());
        assert_eq!(signals.marker_files.len(), 1);
        assert!(signals.cgroup_hint);
    }

    #[test]
    fn test_orchestrator_env_var() {
        let temp_dir = TempDir::new().unwrap();
        std::env::set_var("CUBENAV_TEST_ORCHESTRATOR", "10.0.0.1");
        let detector = detector_in(&temp_dir, "CUBENAV_TEST_ORCHESTRATOR");

        let signals = detector.observe();
        assert_eq!(signals.orchestrator_env, vec!["CUBENAV_TEST_ORCHESTRATOR"]);
        std::env::remove_var("CUBENAV_TEST_ORCHESTRATOR");
    }

    #[test]
    fn test_mount_table_change_detected_once() {
        let temp_dir = TempDir::new().unwrap();
        let mountinfo = temp_dir.path().join("mountinfo");
        fs::write(&mountinfo, "22 1 8:1 / / rw - ext4 /dev/sda1 rw").unwrap();
        let detector = detector_in(&temp_dir, "CUBENAV_TEST_UNSET_ORCHESTRATOR");

        assert!(!detector.observe().mount_table_changed);
        assert!(!detector.observe().mount_table_changed);

        fs::write(&mountinfo, "22 1 8:1 / / ro - ext4 /dev/sda1 ro").unwrap();
        assert!(detector.observe().mount_table_changed);
        assert!(!detector.observe().mount_table_changed);
    }
}
