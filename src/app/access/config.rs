//! Access verification configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::access;

/// Retry policy for access verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Attempts per verification
    pub max_retries: u32,
    /// Constant pause between attempts
    pub retry_delay: Duration,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            max_retries: access::DEFAULT_MAX_RETRIES,
            retry_delay: access::DEFAULT_RETRY_DELAY,
        }
    }
}

impl AccessConfig {
    /// Set the number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the pause between attempts
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 {
            return Err("Max retries must be at least 1".to_string());
        }
        Ok(())
    }
}
