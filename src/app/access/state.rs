//! Per-path accessibility records

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of the most recent verification of a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessState {
    /// Path that was verified
    pub path: PathBuf,
    /// Attempts used by the verification
    pub attempts: u32,
    /// Last error seen, if any attempt failed
    pub last_error: Option<String>,
    /// Whether the path was found readable
    pub is_accessible: bool,
    /// When the verification finished
    pub last_checked_at: DateTime<Utc>,
}

impl AccessState {
    /// Record a successful verification
    pub fn accessible(path: PathBuf, attempts: u32, last_error: Option<String>) -> Self {
        Self {
            path,
            attempts,
            last_error,
            is_accessible: true,
            last_checked_at: Utc::now(),
        }
    }

    /// Record a verification that exhausted its retries
    pub fn inaccessible(path: PathBuf, attempts: u32, last_error: Option<String>) -> Self {
        Self {
            path,
            attempts,
            last_error,
            is_accessible: false,
            last_checked_at: Utc::now(),
        }
    }
}
