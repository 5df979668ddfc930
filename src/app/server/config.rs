//! HTTP server configuration

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{server, static_files};

/// Deployment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development: assets are revalidated on every request
    #[default]
    Development,
    /// Production: assets carry a long `max-age`
    Production,
}

impl Environment {
    /// Lowercase name as used in config files and environment variables
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Whether this is production mode
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!(
                "unknown environment '{}', expected 'development' or 'production'",
                other
            )),
        }
    }
}

/// Configuration for the HTTP server and static responder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (IP literal)
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Deployment mode
    pub environment: Environment,
    /// Directory static files are served from
    pub static_root: PathBuf,
    /// Entry document file name inside the static root
    pub entry_document: String,
    /// Subdirectories of the static root listed by `/health`
    pub listed_subdirs: Vec<String>,
    /// `max-age` for static assets in production
    pub max_age: Duration,
    /// Workspace root hint, diagnostics only
    pub workspace_root: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: server::DEFAULT_HOST.to_string(),
            port: server::DEFAULT_PORT,
            environment: Environment::default(),
            static_root: PathBuf::from(static_files::DEFAULT_ROOT),
            entry_document: static_files::ENTRY_DOCUMENT.to_string(),
            listed_subdirs: vec![static_files::BACKGROUNDS_DIR.to_string()],
            max_age: Duration::from_secs(static_files::DEFAULT_MAX_AGE_SECS),
            workspace_root: None,
        }
    }
}

impl ServerConfig {
    /// Create a configuration for a static root
    pub fn with_static_root(static_root: PathBuf) -> Self {
        Self {
            static_root,
            ..Default::default()
        }
    }

    /// Set the bind port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the bind host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the deployment mode
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Full path of the entry document
    pub fn entry_document_path(&self) -> PathBuf {
        self.static_root.join(&self.entry_document)
    }

    /// `max-age` actually sent for static assets in the current mode
    pub fn effective_max_age(&self) -> Duration {
        if self.environment.is_production() {
            self.max_age
        } else {
            Duration::ZERO
        }
    }

    /// Socket address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("invalid bind address {}:{}: {}", self.host, self.port, e))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.entry_document.is_empty() {
            return Err("Entry document cannot be empty".to_string());
        }

        if self.entry_document.contains('/') || self.entry_document.contains('\\') {
            return Err("Entry document must be a file name inside the static root".to_string());
        }

        self.socket_addr().map(|_| ())
    }
}
