//! Application constants for the cube navigation server
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Port override
    pub const PORT: &str = "PORT";

    /// Environment mode, `development` or `production`
    pub const APP_ENV: &str = "APP_ENV";

    /// Workspace root hint, reported in diagnostics only
    pub const WORKSPACE_ROOT: &str = "WORKSPACE_ROOT";
}

/// HTTP server defaults
pub mod server {
    /// Default bind address
    pub const DEFAULT_HOST: &str = "0.0.0.0";

    /// Default listening port
    pub const DEFAULT_PORT: u16 = 5000;

    /// Health endpoint path
    pub const HEALTH_PATH: &str = "/health";

    /// Favicon path, answered with 204
    pub const FAVICON_PATH: &str = "/favicon.ico";
}

/// Static file layout and caching headers
pub mod static_files {
    /// Default static root, relative to the working directory
    pub const DEFAULT_ROOT: &str = "public";

    /// Background image subdirectory under the static root
    pub const BACKGROUNDS_DIR: &str = "backgrounds";

    /// Single-page application entry document
    pub const ENTRY_DOCUMENT: &str = "index.html";

    /// Listing key used for the static root in `/health`
    pub const ROOT_LISTING_KEY: &str = "public";

    /// Default `max-age` for static assets in production (one day)
    pub const DEFAULT_MAX_AGE_SECS: u64 = 86_400;
}

/// Security response headers attached to every response
pub mod security {
    /// Disable content-type sniffing
    pub const CONTENT_TYPE_OPTIONS: &str = "nosniff";

    /// Deny framing
    pub const FRAME_OPTIONS: &str = "DENY";

    /// HSTS policy (one year, include subdomains)
    pub const STRICT_TRANSPORT_SECURITY: &str = "max-age=31536000; includeSubDomains";
}

/// Stats cache defaults
pub mod cache {
    use super::Duration;

    /// Time-to-live for cached metadata
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5);
}

/// Access verification defaults
pub mod access {
    use super::Duration;

    /// Attempts per verification
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Constant pause between attempts
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);
}

/// Health probe defaults
pub mod health {
    use super::Duration;

    /// Base interval between probes
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

    /// Multiplier applied to the interval after a failed probe
    pub const BACKOFF_FACTOR: f64 = 1.5;

    /// Ceiling for the probe interval
    pub const MAX_INTERVAL: Duration = Duration::from_secs(300);

    /// Largest ceiling a configuration may set
    pub const INTERVAL_LIMIT: Duration = Duration::from_secs(24 * 60 * 60);

    /// Timeout for the probe task to stop on shutdown
    pub const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

    /// Files whose presence marks a container runtime
    pub const CONTAINER_MARKER_FILES: &[&str] = &["/.dockerenv", "/run/.containerenv"];

    /// Environment variables set by common orchestrators
    pub const ORCHESTRATOR_ENV_VARS: &[&str] = &[
        "KUBERNETES_SERVICE_HOST",
        "ECS_CONTAINER_METADATA_URI",
        "container",
    ];

    /// Cgroup file inspected for container hints
    pub const CGROUP_PATH: &str = "/proc/1/cgroup";

    /// Substrings in the cgroup file that indicate a container
    pub const CGROUP_HINTS: &[&str] = &["docker", "kubepods", "containerd", "lxc", "podman"];

    /// Mount table fingerprinted between probes
    pub const MOUNTINFO_PATH: &str = "/proc/self/mountinfo";
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

/// Configuration file locations
pub mod config {
    /// Project-local config file name
    pub const LOCAL_CONFIG_FILE: &str = "cubenav.toml";

    /// Directory name under the user config directory
    pub const CONFIG_DIR_NAME: &str = "cubenav";

    /// Config file name under the user config directory
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}

// Re-export commonly used constants for convenience
pub use env::{APP_ENV as ENV_APP_ENV, PORT as ENV_PORT, WORKSPACE_ROOT as ENV_WORKSPACE_ROOT};
pub use server::{DEFAULT_PORT, FAVICON_PATH, HEALTH_PATH};
pub use static_files::{BACKGROUNDS_DIR, ENTRY_DOCUMENT};
