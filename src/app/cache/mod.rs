//! Filesystem stats cache
//!
//! A time-to-live memoization of metadata lookups keyed by path, shared by
//! request handlers and the health prober.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cubenav_server::app::cache::{CacheConfig, StatsCache};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = StatsCache::new(CacheConfig::default().with_ttl(Duration::from_secs(5)));
//!
//! let stats = cache.get_or_refresh(Path::new("public/index.html")).await?;
//! println!("{} bytes, mode {}", stats.size, stats.permissions_octal());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod manager;
pub mod source;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use config::CacheConfig;
pub use manager::StatsCache;
pub use source::{FsMetadataSource, MetadataSource};
pub use stats::{CacheEntry, FileStats};
