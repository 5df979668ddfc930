//! Configuration management for the cube navigation server
//!
//! This module provides unified configuration management with multi-source
//! loading (defaults, TOML file, environment variables) and conversion into
//! the runtime configuration of each component.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::app::{AccessConfig, CacheConfig, Environment, HealthConfig, ServerConfig};
use crate::constants::{access, cache, config, env, health, logging, server, static_files};
use crate::errors::{AppError, ConfigError, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Listener settings
    pub server: ServerConfigToml,
    /// Static file layout
    pub static_files: StaticFilesConfigToml,
    /// Stats cache settings
    pub cache: CacheConfigToml,
    /// Access verification settings
    pub access: AccessConfigToml,
    /// Health probe settings
    pub health: HealthConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfigToml {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// `development` or `production`
    pub environment: Environment,
}

impl Default for ServerConfigToml {
    fn default() -> Self {
        Self {
            host: server::DEFAULT_HOST.to_string(),
            port: server::DEFAULT_PORT,
            environment: Environment::default(),
        }
    }
}

/// TOML-friendly static file configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StaticFilesConfigToml {
    /// Static root directory
    pub root: PathBuf,
    /// Subdirectories that must exist and are listed by `/health`
    pub required_subdirs: Vec<String>,
    /// Entry document file name
    pub entry_document: String,
    /// `max-age` for static assets in production, in seconds
    pub max_age_secs: u64,
}

impl Default for StaticFilesConfigToml {
    fn default() -> Self {
        Self {
            root: PathBuf::from(static_files::DEFAULT_ROOT),
            required_subdirs: vec![static_files::BACKGROUNDS_DIR.to_string()],
            entry_document: static_files::ENTRY_DOCUMENT.to_string(),
            max_age_secs: static_files::DEFAULT_MAX_AGE_SECS,
        }
    }
}

/// TOML-friendly cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfigToml {
    /// Time-to-live for cached metadata in milliseconds
    pub ttl_ms: u64,
}

impl Default for CacheConfigToml {
    fn default() -> Self {
        Self {
            ttl_ms: cache::DEFAULT_TTL.as_millis() as u64,
        }
    }
}

/// TOML-friendly access verification configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AccessConfigToml {
    /// Attempts per verification
    pub max_retries: u32,
    /// Constant pause between attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for AccessConfigToml {
    fn default() -> Self {
        Self {
            max_retries: access::DEFAULT_MAX_RETRIES,
            retry_delay_ms: access::DEFAULT_RETRY_DELAY.as_millis() as u64,
        }
    }
}

/// TOML-friendly health probe configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HealthConfigToml {
    /// Base probe interval in seconds
    pub interval_secs: u64,
    /// Interval multiplier after a failed probe
    pub backoff_factor: f64,
    /// Interval ceiling in seconds
    pub max_interval_secs: u64,
    /// Fold container signals into the health verdict
    pub container_checks: bool,
}

impl Default for HealthConfigToml {
    fn default() -> Self {
        Self {
            interval_secs: health::DEFAULT_INTERVAL.as_secs(),
            backoff_factor: health::BACKOFF_FACTOR,
            max_interval_secs: health::MAX_INTERVAL.as_secs(),
            container_checks: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Runtime configuration of every component
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub access: AccessConfig,
    pub health: HealthConfig,
}

impl RuntimeConfig {
    /// Validate every component configuration, collecting all problems
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let errors: Vec<String> = [
            self.server.validate(),
            self.cache.validate(),
            self.access.validate(),
            self.health.validate(),
        ]
        .into_iter()
        .filter_map(|result| result.err())
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed { errors })
        }
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> RuntimeConfig {
        let static_root = self.static_files.root.clone();

        let server = ServerConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            environment: self.server.environment,
            static_root: static_root.clone(),
            entry_document: self.static_files.entry_document.clone(),
            listed_subdirs: self.static_files.required_subdirs.clone(),
            max_age: Duration::from_secs(self.static_files.max_age_secs),
            workspace_root: std::env::var(env::WORKSPACE_ROOT).ok(),
        };

        let health = HealthConfig {
            static_root,
            required_subdirs: self.static_files.required_subdirs.clone(),
            interval: Duration::from_secs(self.health.interval_secs),
            backoff_factor: self.health.backoff_factor,
            max_interval: Duration::from_secs(self.health.max_interval_secs),
            max_retries: self.access.max_retries,
            container_checks: self.health.container_checks,
        };

        RuntimeConfig {
            server,
            cache: CacheConfig::default().with_ttl(Duration::from_millis(self.cache.ttl_ms)),
            access: AccessConfig::default()
                .with_max_retries(self.access.max_retries)
                .with_retry_delay(Duration::from_millis(self.access.retry_delay_ms)),
            health,
        }
    }

    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    ///
    /// CLI arguments are applied by the caller on top of the result.
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        let config_path = match config_file_override {
            Some(ref path) => Some(path.clone()),
            None => Self::find_config_file(),
        };

        if let Some(path) = config_path {
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                config = Self::load_from_file(&path).await?;
            } else if config_file_override.is_some() {
                return Err(ConfigError::NotFound { path }.into());
            }
        }

        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply `PORT` and `APP_ENV` overrides from an environment lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(env::PORT) {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: env::PORT.to_string(),
                value: port.clone(),
                reason: "expected a port number between 0 and 65535".to_string(),
            })?;
            debug!("Port overridden by {}: {}", env::PORT, self.server.port);
        }

        if let Some(mode) = lookup(env::APP_ENV) {
            self.server.environment =
                mode.parse().map_err(|reason| ConfigError::InvalidValue {
                    field: env::APP_ENV.to_string(),
                    value: mode.clone(),
                    reason,
                })?;
            debug!(
                "Environment overridden by {}: {}",
                env::APP_ENV,
                self.server.environment
            );
        }

        Ok(())
    }

    /// Write a default configuration file if none exists
    ///
    /// Returns the path of the config file and whether it was created.
    pub async fn initialize_first_run(target: Option<PathBuf>) -> Result<(PathBuf, bool)> {
        let config_path = match target {
            Some(path) => path,
            None => Self::get_default_config_path()?,
        };

        if config_path.exists() {
            return Ok((config_path, false));
        }

        info!("Creating default configuration file...");

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::generic(format!(
                        "Failed to create config directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|e| {
                AppError::generic(format!(
                    "Failed to write config file {}: {}",
                    config_path.display(),
                    e
                ))
            })?;

        Ok((config_path, true))
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(ConfigError::from)
            .map_err(AppError::from)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(config::LOCAL_CONFIG_FILE)];
        if let Ok(user_config) = Self::get_default_config_path() {
            search_paths.push(user_config);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Get the default config file path for the current user
    fn get_default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::generic("Could not determine user config directory"))?;

        Ok(config_dir
            .join(config::CONFIG_DIR_NAME)
            .join(config::CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(|e| {
            warn!("Failed to parse config file {}: {}", path.display(), e);
            ConfigError::from(e)
        })?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    fn generate_default_config_content() -> String {
        format!(
            r#"# Cube navigation server configuration
# Environment variables PORT and APP_ENV override [server] values.

[server]
host = "{host}"
port = {port}
environment = "development"  # development or production

[static_files]
root = "{root}"
required_subdirs = ["{backgrounds}"]
entry_document = "{entry}"
# max-age for assets in production (development always sends max-age=0)
max_age_secs = {max_age}

[cache]
# How long file metadata is trusted before it is looked up again
ttl_ms = {ttl_ms}

[access]
# Attempts per accessibility check, with a constant pause between them
max_retries = {max_retries}
retry_delay_ms = {retry_delay_ms}

[health]
interval_secs = {interval}
# Interval multiplier while unhealthy, capped at max_interval_secs
backoff_factor = {backoff}
max_interval_secs = {max_interval}
container_checks = true

[logging]
level = "{level}"  # error, warn, info, debug, trace
"#,
            host = server::DEFAULT_HOST,
            port = server::DEFAULT_PORT,
            root = static_files::DEFAULT_ROOT,
            backgrounds = static_files::BACKGROUNDS_DIR,
            entry = static_files::ENTRY_DOCUMENT,
            max_age = static_files::DEFAULT_MAX_AGE_SECS,
            ttl_ms = cache::DEFAULT_TTL.as_millis(),
            max_retries = access::DEFAULT_MAX_RETRIES,
            retry_delay_ms = access::DEFAULT_RETRY_DELAY.as_millis(),
            interval = health::DEFAULT_INTERVAL.as_secs(),
            backoff = health::BACKOFF_FACTOR,
            max_interval = health::MAX_INTERVAL.as_secs(),
            level = logging::DEFAULT_LOG_LEVEL,
        )
    }
}
