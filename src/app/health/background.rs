//! Background task management for the health prober
//!
//! Runs the prober on its self-tuning schedule until shutdown is broadcast,
//! with the same shutdown handling the server uses for every background task.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::constants::health;

use super::prober::HealthProber;

/// Owns the server's background tasks
pub struct BackgroundTaskManager {
    tasks: Vec<JoinHandle<()>>,
}

impl BackgroundTaskManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Start the periodic health probe
    ///
    /// The first probe runs one interval after startup; startup verification
    /// has already probed once.
    pub fn start_probe_task(
        &mut self,
        prober: Arc<HealthProber>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let task = tokio::spawn(async move {
            loop {
                let interval = prober.current_interval().await;

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        let report = prober.probe().await;
                        if report.is_healthy() {
                            debug!(
                                "Health probe passed: {} entries in {} ms",
                                report.files.len(),
                                report.duration_ms
                            );
                        } else {
                            info!(
                                "Health probe failed with {} errors, next probe in {:?}",
                                report.errors.len(),
                                prober.current_interval().await
                            );
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Probe task received shutdown signal");
                        break;
                    }
                }
            }
        });

        self.tasks.push(task);
    }

    /// Wait for every task to stop, aborting any that outlive the timeout
    ///
    /// Shutdown must already have been broadcast.
    pub async fn shutdown_all(self) {
        let count = self.tasks.len();
        let mut aborted = 0;

        for mut task in self.tasks {
            match tokio::time::timeout(health::TASK_SHUTDOWN_TIMEOUT, &mut task).await {
                Ok(Err(e)) if e.is_panic() => warn!("Background task panicked: {}", e),
                Ok(_) => {}
                Err(_) => {
                    task.abort();
                    aborted += 1;
                }
            }
        }

        if aborted > 0 {
            warn!(
                "Aborted {} of {} background tasks after {:?}",
                aborted,
                count,
                health::TASK_SHUTDOWN_TIMEOUT
            );
        } else {
            debug!("Stopped {} background tasks", count);
        }
    }

    /// Number of tasks started
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Default for BackgroundTaskManager {
    fn default() -> Self {
        Self::new()
    }
}
