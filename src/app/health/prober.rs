//! Periodic filesystem health probe
//!
//! Each run checks that the static root and its required subdirectories are
//! directories, verifies every entry in them, and heals itself when anything
//! failed: the whole stats cache is dropped and the failed paths get one more
//! attempt against the live filesystem. The prober also owns the probe
//! schedule and the consecutive-failure counter.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::app::access::AccessVerifier;
use crate::app::cache::StatsCache;
use crate::errors::FsError;

use super::config::HealthConfig;
use super::container::ContainerDetector;
use super::report::{DirectoryStatus, FileStatus, ProbeReport};
use super::schedule::ProbeSchedule;

/// Filesystem health prober
#[derive(Debug)]
pub struct HealthProber {
    /// Configuration
    config: HealthConfig,
    /// Shared stats cache, cleared on unhealthiness
    cache: Arc<StatsCache>,
    /// Shared access verifier
    verifier: Arc<AccessVerifier>,
    /// Container signal source, when enabled
    detector: Option<Arc<ContainerDetector>>,
    /// Consecutive unhealthy runs
    error_count: AtomicU32,
    /// Self-tuning interval
    schedule: Mutex<ProbeSchedule>,
    /// Most recent report
    last_report: RwLock<Option<ProbeReport>>,
}

impl HealthProber {
    /// Create a prober sharing the cache and verifier used by request handlers
    pub fn new(config: HealthConfig, cache: Arc<StatsCache>, verifier: Arc<AccessVerifier>) -> Self {
        let detector = config
            .container_checks
            .then(|| Arc::new(ContainerDetector::new()));
        Self::with_detector(config, cache, verifier, detector)
    }

    /// Create a prober with an explicit container detector
    pub fn with_detector(
        config: HealthConfig,
        cache: Arc<StatsCache>,
        verifier: Arc<AccessVerifier>,
        detector: Option<Arc<ContainerDetector>>,
    ) -> Self {
        let schedule = ProbeSchedule::new(
            config.interval,
            config.backoff_factor,
            config.max_interval,
        );

        Self {
            config,
            cache,
            verifier,
            detector,
            error_count: AtomicU32::new(0),
            schedule: Mutex::new(schedule),
            last_report: RwLock::new(None),
        }
    }

    /// Get the probe configuration
    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    /// Run one probe, update the schedule and error counter, and keep the report
    pub async fn probe(&self) -> ProbeReport {
        let started = Instant::now();
        let mut report = ProbeReport::new();

        if self.check_directories(&mut report).await {
            let failed = self.verify_entries(&mut report).await;
            let prior_errors = self.error_count.load(Ordering::Relaxed);

            if !failed.is_empty() || prior_errors > 0 {
                self.recover(&mut report, failed).await;
            }
        }

        self.observe_container(&mut report).await;
        report.set_duration(started.elapsed());
        self.finish(&report).await;

        let mut last = self.last_report.write().await;
        *last = Some(report.clone());
        report
    }

    /// Whether the most recent probe passed; false before the first probe
    pub async fn is_healthy(&self) -> bool {
        self.last_report
            .read()
            .await
            .as_ref()
            .map(ProbeReport::is_healthy)
            .unwrap_or(false)
    }

    /// Most recent report, if any probe has run
    pub async fn last_report(&self) -> Option<ProbeReport> {
        self.last_report.read().await.clone()
    }

    /// Interval until the next scheduled probe
    pub async fn current_interval(&self) -> Duration {
        self.schedule.lock().await.current()
    }

    /// Consecutive unhealthy runs
    pub fn consecutive_failures(&self) -> u32 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Stat the root and required subdirectories, bypassing cached entries
    async fn check_directories(&self, report: &mut ProbeReport) -> bool {
        let mut all_ok = true;
        let mut dirs = vec![self.config.static_root.clone()];
        dirs.extend(self.config.required_dirs());

        for dir in dirs {
            let key = dir.display().to_string();
            let status = match self.cache.refresh(&dir).await {
                Ok(stats) => {
                    let status = DirectoryStatus::from_stats(&stats);
                    if !status.is_directory {
                        report.add_error(FsError::DirectoryExpected { path: dir.clone() }.to_string());
                    }
                    status
                }
                Err(e) => {
                    report.add_error(e.to_string());
                    DirectoryStatus::missing()
                }
            };

            all_ok &= status.is_ok();
            report.directories.insert(key, status);
        }

        if !all_ok {
            warn!("Health probe: required directories are missing or invalid");
        }
        all_ok
    }

    /// Verify every direct entry of the probed directories
    ///
    /// Returns the entries that failed verification.
    async fn verify_entries(&self, report: &mut ProbeReport) -> Vec<PathBuf> {
        let mut failed = Vec::new();
        let mut dirs = vec![self.config.static_root.clone()];
        dirs.extend(self.config.required_dirs());

        for dir in dirs {
            let entries = match self.cache.read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    report.add_error(format!("Failed to list {}: {}", dir.display(), e));
                    continue;
                }
            };

            for entry in entries {
                let stats = self
                    .verifier
                    .verify_stats(&entry, self.config.max_retries)
                    .await;

                if stats.is_none() {
                    failed.push(entry.clone());
                }
                report.files.insert(
                    entry.display().to_string(),
                    FileStatus {
                        is_accessible: stats.is_some(),
                        size: stats.map(|s| s.size),
                    },
                );
            }
        }

        debug!(
            "Health probe verified {} entries, {} failed",
            report.files.len(),
            failed.len()
        );
        failed
    }

    /// Drop the whole cache and give failed paths one more attempt
    async fn recover(&self, report: &mut ProbeReport, failed: Vec<PathBuf>) {
        let cleared = self.cache.clear().await;
        info!(
            "Health probe recovery pass: cleared {} cache entries, re-verifying {} paths",
            cleared,
            failed.len()
        );

        for path in failed {
            let key = path.display().to_string();
            match self.verifier.verify_stats(&path, 1).await {
                Some(stats) => {
                    info!("Recovered access to {}", key);
                    report.files.insert(
                        key.clone(),
                        FileStatus {
                            is_accessible: true,
                            size: Some(stats.size),
                        },
                    );
                    report.recovered.push(key);
                }
                None => {
                    report.add_error(format!("{} is not accessible", key));
                }
            }
        }
    }

    async fn observe_container(&self, report: &mut ProbeReport) {
        let Some(detector) = &self.detector else {
            return;
        };

        let detector = Arc::clone(detector);
        match tokio::task::spawn_blocking(move || detector.observe()).await {
            Ok(signals) => {
                if signals.mount_table_changed {
                    report.add_error("Mount table changed since previous probe");
                }
                report.container = Some(signals);
            }
            Err(e) => warn!("Container detection failed: {}", e),
        }
    }

    /// Update the error counter and schedule from the run's verdict
    async fn finish(&self, report: &ProbeReport) {
        let healthy = report.is_healthy();

        if healthy {
            let previous = self.error_count.swap(0, Ordering::Relaxed);
            if previous > 0 {
                info!("Health restored after {} failed probes", previous);
            }
        } else {
            let count = self.error_count.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                "Health probe failed ({} consecutive): {}",
                count,
                report.errors.join("; ")
            );
        }

        let next = self.schedule.lock().await.record(healthy);
        debug!("Next health probe in {:?}", next);
    }

    /// Root directory being probed
    pub fn static_root(&self) -> &Path {
        &self.config.static_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::access::AccessConfig;
    use crate::app::cache::testing::ScriptedSource;
    use crate::app::cache::{CacheConfig, MetadataSource};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        prober: HealthProber,
        cache: Arc<StatsCache>,
        source: Arc<ScriptedSource>,
        root: PathBuf,
        _temp_dir: TempDir,
    }

    fn create_site(temp_dir: &TempDir) -> PathBuf {
        let root = temp_dir.path().join("public");
        fs::create_dir_all(root.join("backgrounds")).unwrap();
        fs::write(root.join("index.html"), "<html></html>").unwrap();
        fs::write(root.join("app.js"), "console.log('cube')").unwrap();
        fs::write(root.join("backgrounds").join("sky.jpg"), vec![1u8; 32]).unwrap();
        root
    }

    fn create_fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let root = create_site(&temp_dir);

        let source = Arc::new(ScriptedSource::new());
        let cache = Arc::new(StatsCache::with_source(
            CacheConfig::default().with_ttl(Duration::from_secs(60)),
            Arc::clone(&source) as Arc<dyn MetadataSource>,
        ));
        let verifier = Arc::new(AccessVerifier::new(
            AccessConfig::default().with_retry_delay(Duration::from_millis(1)),
            Arc::clone(&cache),
        ));
        let config = HealthConfig::with_static_root(root.clone())
            .with_interval(Duration::from_secs(10))
            .with_max_interval(Duration::from_secs(60))
            .with_max_retries(2)
            .with_container_checks(false);

        Fixture {
            prober: HealthProber::new(config, Arc::clone(&cache), verifier),
            cache,
            source,
            root,
            _temp_dir: temp_dir,
        }
    }

    #[tokio::test]
    async fn test_healthy_site() {
        let fixture = create_fixture();
        assert!(!fixture.prober.is_healthy().await);

        let report = fixture.prober.probe().await;

        assert!(report.is_healthy(), "errors: {:?}", report.errors);
        assert_eq!(report.directories.len(), 2);
        // index.html, app.js, backgrounds/ and backgrounds/sky.jpg
        assert_eq!(report.files.len(), 4);
        assert!(report.recovered.is_empty());
        assert!(fixture.prober.is_healthy().await);
        assert_eq!(fixture.prober.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_missing_required_subdir_is_unhealthy() {
        let fixture = create_fixture();
        fs::remove_dir_all(fixture.root.join("backgrounds")).unwrap();

        let report = fixture.prober.probe().await;

        assert!(!report.is_healthy());
        assert!(report.files.is_empty());
        let key = fixture.root.join("backgrounds").display().to_string();
        assert!(!report.directories[&key].exists);
    }

    #[tokio::test]
    async fn test_subdir_that_is_a_file_is_unhealthy() {
        let fixture = create_fixture();
        fs::remove_dir_all(fixture.root.join("backgrounds")).unwrap();
        fs::write(fixture.root.join("backgrounds"), "not a dir").unwrap();

        let report = fixture.prober.probe().await;

        assert!(!report.is_healthy());
        assert!(report
            .errors
            .iter()
            .any(|error| error.contains("Expected a directory")));
    }

    #[tokio::test]
    async fn test_missing_root_is_unhealthy() {
        let fixture = create_fixture();
        fs::remove_dir_all(&fixture.root).unwrap();

        let report = fixture.prober.probe().await;
        assert!(!report.is_healthy());
        assert_eq!(fixture.prober.consecutive_failures(), 1);
    }

    #[tokio::test]
    async fn test_recovery_pass_clears_cache_and_recovers() {
        let fixture = create_fixture();
        let flaky = fixture.root.join("app.js");
        // Fails both main-pass attempts, succeeds on the recovery attempt
        fixture.source.fail_stat(&flaky, 2);

        let report = fixture.prober.probe().await;

        assert!(report.is_healthy(), "errors: {:?}", report.errors);
        assert_eq!(report.recovered, vec![flaky.display().to_string()]);
        assert!(report.files[&flaky.display().to_string()].is_accessible);
        assert_eq!(fixture.source.stat_calls(&flaky), 3);
        // Only the recovered path was re-cached after the clear
        assert_eq!(fixture.cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_persistent_failure_is_reported() {
        let fixture = create_fixture();
        let broken = fixture.root.join("backgrounds").join("sky.jpg");
        fixture.source.fail_stat_always(&broken);

        let report = fixture.prober.probe().await;

        assert!(!report.is_healthy());
        assert_eq!(report.inaccessible_files(), vec![broken.display().to_string()]);
        assert_eq!(fixture.prober.consecutive_failures(), 1);
    }

    #[tokio::test]
    async fn test_interval_backs_off_and_resets() {
        let fixture = create_fixture();
        let broken = fixture.root.join("app.js");
        fixture.source.fail_stat_always(&broken);

        fixture.prober.probe().await;
        assert_eq!(fixture.prober.current_interval().await, Duration::from_secs(15));
        fixture.prober.probe().await;
        assert_eq!(
            fixture.prober.current_interval().await,
            Duration::from_millis(22_500)
        );

        fixture.source.heal();
        let report = fixture.prober.probe().await;

        assert!(report.is_healthy(), "errors: {:?}", report.errors);
        assert_eq!(fixture.prober.current_interval().await, Duration::from_secs(10));
        assert_eq!(fixture.prober.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_prior_failure_triggers_cache_clear() {
        let fixture = create_fixture();
        fs::remove_dir_all(&fixture.root.join("backgrounds")).unwrap();
        fixture.prober.probe().await;
        assert_eq!(fixture.prober.consecutive_failures(), 1);

        fs::create_dir_all(fixture.root.join("backgrounds")).unwrap();
        let lookups_before = fixture.cache.lookup_count();
        let report = fixture.prober.probe().await;

        assert!(report.is_healthy(), "errors: {:?}", report.errors);
        assert!(fixture.cache.lookup_count() > lookups_before);
        // Cleared by the recovery pass even though nothing failed this run
        assert!(fixture.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_mount_table_change_marks_unhealthy() {
        let temp_dir = TempDir::new().unwrap();
        let root = create_site(&temp_dir);
        let mountinfo = temp_dir.path().join("mountinfo");
        fs::write(&mountinfo, "a").unwrap();

        let cache = Arc::new(StatsCache::new(CacheConfig::default()));
        let verifier = Arc::new(AccessVerifier::new(
            AccessConfig::default(),
            Arc::clone(&cache),
        ));
        let detector = Arc::new(ContainerDetector::with_paths(
            Vec::new(),
            Vec::new(),
            temp_dir.path().join("cgroup"),
            mountinfo.clone(),
        ));
        let prober = HealthProber::with_detector(
            HealthConfig::with_static_root(root),
            cache,
            verifier,
            Some(detector),
        );

        assert!(prober.probe().await.is_healthy());

        fs::write(&mountinfo, "b").unwrap();
        let report = prober.probe().await;
        assert!(!report.is_healthy());
        assert!(report.container.unwrap().mount_table_changed);
        assert_eq!(prober.consecutive_failures(), 1);
    }
}
