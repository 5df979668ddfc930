//! Cube navigation server library
//!
//! Serves the cube navigation single-page application and its background
//! images with a history fallback, security headers, a TTL stats cache,
//! retrying access checks and a self-healing filesystem health probe.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::*;

    #[test]
    fn test_constants_accessible() {
        assert_eq!(DEFAULT_PORT, 5000);
        assert_eq!(ENV_PORT, "PORT");
        assert_eq!(HEALTH_PATH, "/health");
        assert_eq!(ENTRY_DOCUMENT, "index.html");
    }

    #[test]
    fn test_error_types() {
        let config_error = errors::ConfigError::ValidationFailed {
            errors: vec!["bad".to_string()],
        };
        let app_error = AppError::Config(config_error);

        assert_eq!(app_error.category(), "config");
        assert!(!app_error.is_recoverable());
    }
}
