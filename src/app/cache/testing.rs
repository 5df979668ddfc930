//! Scripted metadata source for unit tests
//!
//! Wraps the real filesystem and lets a test count calls per path and make
//! stats or read checks fail a chosen number of times.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::{FsError, FsResult};

use super::source::{FsMetadataSource, MetadataSource};
use super::stats::FileStats;

#[derive(Debug, Default)]
struct Script {
    stat_calls: HashMap<PathBuf, u32>,
    read_calls: HashMap<PathBuf, u32>,
    stat_failures: HashMap<PathBuf, u32>,
    denied: Vec<PathBuf>,
}

/// Counting, failure-injecting `MetadataSource`
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<Script>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `times` stats of `path` fail with `NotFound`
    pub fn fail_stat(&self, path: &Path, times: u32) {
        let mut script = self.script.lock().unwrap();
        script.stat_failures.insert(path.to_path_buf(), times);
    }

    /// Make every stat of `path` fail
    pub fn fail_stat_always(&self, path: &Path) {
        self.fail_stat(path, u32::MAX);
    }

    /// Make read checks of `path` fail with `PermissionDenied`
    pub fn deny_read(&self, path: &Path) {
        self.script.lock().unwrap().denied.push(path.to_path_buf());
    }

    /// Remove all injected failures
    pub fn heal(&self) {
        let mut script = self.script.lock().unwrap();
        script.stat_failures.clear();
        script.denied.clear();
    }

    pub fn stat_calls(&self, path: &Path) -> u32 {
        let script = self.script.lock().unwrap();
        script.stat_calls.get(path).copied().unwrap_or(0)
    }

    pub fn read_calls(&self, path: &Path) -> u32 {
        let script = self.script.lock().unwrap();
        script.read_calls.get(path).copied().unwrap_or(0)
    }

    pub fn total_stat_calls(&self) -> u32 {
        self.script.lock().unwrap().stat_calls.values().sum()
    }
}

impl MetadataSource for ScriptedSource {
    fn stat(&self, path: &Path) -> FsResult<FileStats> {
        {
            let mut script = self.script.lock().unwrap();
            *script.stat_calls.entry(path.to_path_buf()).or_insert(0) += 1;

            if let Some(remaining) = script.stat_failures.get_mut(path) {
                if *remaining > 0 {
                    if *remaining != u32::MAX {
                        *remaining -= 1;
                    }
                    return Err(FsError::NotFound {
                        path: path.to_path_buf(),
                    });
                }
            }
        }
        FsMetadataSource.stat(path)
    }

    fn check_readable(&self, path: &Path) -> FsResult<()> {
        {
            let mut script = self.script.lock().unwrap();
            *script.read_calls.entry(path.to_path_buf()).or_insert(0) += 1;

            if script.denied.iter().any(|denied| denied == path) {
                return Err(FsError::PermissionDenied {
                    path: path.to_path_buf(),
                });
            }
        }
        FsMetadataSource.check_readable(path)
    }

    fn read_dir(&self, path: &Path) -> FsResult<Vec<PathBuf>> {
        FsMetadataSource.read_dir(path)
    }
}
