//! Error types for the cube navigation server
//!
//! This module defines the error types for every component of the server.
//! Filesystem errors are kept small and cloneable because they are recorded
//! in access state and probe reports, while the top-level `AppError` carries
//! everything that can end the process.

use std::io;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Filesystem lookup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    /// Path does not exist
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Path exists but cannot be read
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path exists but is not a directory where one is required
    #[error("Expected a directory: {path}")]
    DirectoryExpected { path: PathBuf },

    /// Any other I/O failure
    #[error("I/O error on {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl FsError {
    /// Classify an I/O error raised while touching `path`
    pub fn from_io(path: impl Into<PathBuf>, error: &io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            io::ErrorKind::NotFound => FsError::NotFound { path },
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied { path },
            _ => FsError::Io {
                path,
                message: error.to_string(),
            },
        }
    }

    /// Path the error refers to
    pub fn path(&self) -> &PathBuf {
        match self {
            FsError::NotFound { path }
            | FsError::PermissionDenied { path }
            | FsError::DirectoryExpected { path }
            | FsError::Io { path, .. } => path,
        }
    }

    /// Short machine-readable kind, used in reports and logs
    pub fn kind(&self) -> &'static str {
        match self {
            FsError::NotFound { .. } => "not_found",
            FsError::PermissionDenied { .. } => "permission_denied",
            FsError::DirectoryExpected { .. } => "directory_expected",
            FsError::Io { .. } => "io",
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be rendered back to TOML
    #[error("Failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<String> },
}

/// Startup verification errors
#[derive(Error, Debug)]
pub enum StartupError {
    /// Static root is missing or unusable
    #[error("Static root is not usable: {0}")]
    StaticRoot(FsError),

    /// A required subdirectory is missing or unusable
    #[error("Required directory is not usable: {0}")]
    RequiredDirectory(FsError),

    /// Entry document is missing or unreadable
    #[error("Entry document is not usable: {0}")]
    EntryDocument(FsError),
}

/// HTTP server errors
#[derive(Error, Debug)]
pub enum ServerError {
    /// Listener could not bind because the port is taken
    #[error("Address already in use: {addr}")]
    AddressInUse { addr: String },

    /// Listener could not bind for another reason
    #[error("Failed to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Serving loop failed
    #[error("HTTP server error")]
    Serve(#[source] io::Error),

    /// Entry document could not be verified for a request
    #[error("Entry document unavailable: {path}")]
    EntryDocumentUnavailable { path: PathBuf },

    /// Internal failure while building a response
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status code for request-scoped errors
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::EntryDocumentUnavailable { .. } | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // Never expose filesystem paths to clients
        let status = self.status_code();
        let body = match &self {
            ServerError::EntryDocumentUnavailable { .. } | ServerError::Internal(_) => {
                "Internal Server Error"
            }
            _ => "Service Unavailable",
        };

        (status, body).into_response()
    }
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Filesystem error
    #[error(transparent)]
    Fs(#[from] FsError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Startup verification error
    #[error(transparent)]
    Startup(#[from] StartupError),

    /// HTTP server error
    #[error(transparent)]
    Server(#[from] ServerError),

    /// JSON rendering error
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is transient and worth retrying
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Fs(
                FsError::NotFound { .. } | FsError::PermissionDenied { .. } | FsError::Io { .. }
            )
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Fs(_) => "filesystem",
            AppError::Config(_) => "config",
            AppError::Startup(_) => "startup",
            AppError::Server(_) => "server",
            AppError::Json(_) => "json",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Filesystem result type alias
pub type FsResult<T> = std::result::Result<T, FsError>;
