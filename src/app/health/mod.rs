//! Filesystem health probing
//!
//! The prober walks the static root and its required subdirectories on a
//! timer, verifies every entry, clears the stats cache and retries failures
//! when something is wrong, and stretches its own interval while unhealthy.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use cubenav_server::app::access::{AccessConfig, AccessVerifier};
//! use cubenav_server::app::cache::{CacheConfig, StatsCache};
//! use cubenav_server::app::health::{HealthConfig, HealthProber};
//!
//! # async fn example() {
//! let cache = Arc::new(StatsCache::new(CacheConfig::default()));
//! let verifier = Arc::new(AccessVerifier::new(AccessConfig::default(), Arc::clone(&cache)));
//! let prober = HealthProber::new(
//!     HealthConfig::with_static_root(PathBuf::from("public")),
//!     cache,
//!     verifier,
//! );
//!
//! let report = prober.probe().await;
//! println!("healthy: {}, errors: {:?}", report.healthy, report.errors);
//! # }
//! ```

pub mod background;
pub mod config;
pub mod container;
pub mod prober;
pub mod report;
pub mod schedule;

pub use background::BackgroundTaskManager;
pub use config::HealthConfig;
pub use container::{ContainerDetector, ContainerSignals};
pub use prober::HealthProber;
pub use report::{DirectoryStatus, FileStatus, ProbeReport};
pub use schedule::ProbeSchedule;
