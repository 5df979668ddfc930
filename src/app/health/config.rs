//! Health probe configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{health, static_files};

/// Configuration for the periodic filesystem health probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Static root that must exist and be a directory
    pub static_root: PathBuf,
    /// Subdirectories of the static root that must exist
    pub required_subdirs: Vec<String>,
    /// Base interval between probes
    pub interval: Duration,
    /// Interval multiplier applied after a failed probe
    pub backoff_factor: f64,
    /// Interval ceiling
    pub max_interval: Duration,
    /// Attempts per entry during the main pass
    pub max_retries: u32,
    /// Fold container signals into the health verdict
    pub container_checks: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            static_root: PathBuf::from(static_files::DEFAULT_ROOT),
            required_subdirs: vec![static_files::BACKGROUNDS_DIR.to_string()],
            interval: health::DEFAULT_INTERVAL,
            backoff_factor: health::BACKOFF_FACTOR,
            max_interval: health::MAX_INTERVAL,
            max_retries: crate::constants::access::DEFAULT_MAX_RETRIES,
            container_checks: true,
        }
    }
}

impl HealthConfig {
    /// Create a configuration for a static root
    pub fn with_static_root(static_root: PathBuf) -> Self {
        Self {
            static_root,
            ..Default::default()
        }
    }

    /// Set the required subdirectories
    pub fn with_required_subdirs(mut self, subdirs: Vec<String>) -> Self {
        self.required_subdirs = subdirs;
        self
    }

    /// Set the base probe interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the interval ceiling
    pub fn with_max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }

    /// Set the attempts per entry
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Enable or disable container checks
    pub fn with_container_checks(mut self, enabled: bool) -> Self {
        self.container_checks = enabled;
        self
    }

    /// Absolute-or-relative paths of the required subdirectories
    pub fn required_dirs(&self) -> Vec<PathBuf> {
        self.required_subdirs
            .iter()
            .map(|name| self.static_root.join(name))
            .collect()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.interval.is_zero() {
            return Err("Probe interval cannot be zero".to_string());
        }

        if self.max_interval < self.interval {
            return Err("Maximum probe interval cannot be below the base interval".to_string());
        }

        if self.max_interval > health::INTERVAL_LIMIT {
            return Err(format!(
                "Maximum probe interval cannot exceed {} seconds",
                health::INTERVAL_LIMIT.as_secs()
            ));
        }

        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err("Probe backoff factor must be a finite number of at least 1.0".to_string());
        }

        Ok(())
    }
}
