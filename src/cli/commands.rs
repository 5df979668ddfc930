//! Command handlers for the cube navigation server CLI
//!
//! This module implements the command handlers that turn CLI arguments and
//! the loaded configuration into a running server, a one-shot check, or
//! configuration output.

use std::path::PathBuf;

use tracing::{error, info};

use crate::app::server::{AppState, Environment, Server};
use crate::cli::{verify_startup, CheckArgs, ConfigAction, ConfigArgs, ServeArgs};
use crate::config::{AppConfig, RuntimeConfig};
use crate::errors::{AppError, Result};

/// Handle the serve command
///
/// Verifies the static layout, binds the listener and serves until CTRL-C or
/// SIGTERM. Any failure before the listener is up ends the process.
pub async fn handle_serve(args: ServeArgs, mut config: AppConfig) -> Result<()> {
    apply_serve_args(&mut config, &args);
    let runtime = validated_runtime(&config)?;

    let state = AppState::from_config(runtime.server, runtime.cache, runtime.access, runtime.health);

    if let Err(e) = verify_startup(&state).await {
        error!("Startup verification failed: {}", e);
        return Err(e.into());
    }

    let server = Server::bind(state).await?;
    info!(
        "cubenav-server v{} ready on {}",
        env!("CARGO_PKG_VERSION"),
        server.local_addr()?
    );

    server.run().await?;
    info!("Server shut down cleanly");
    Ok(())
}

/// Handle the check command
///
/// Runs startup verification plus one probe and prints the report as JSON.
/// An unhealthy report is an error so the exit code reflects it.
pub async fn handle_check(args: CheckArgs, mut config: AppConfig) -> Result<()> {
    if let Some(root) = args.static_root {
        config.static_files.root = root;
    }
    // A one-shot check has no previous mount table to compare against
    config.health.container_checks = false;
    let runtime = validated_runtime(&config)?;

    let state = AppState::from_config(runtime.server, runtime.cache, runtime.access, runtime.health);
    let report = verify_startup(&state).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.is_healthy() {
        Ok(())
    } else {
        Err(AppError::generic(format!(
            "Health check failed with {} errors",
            report.errors.len()
        )))
    }
}

/// Handle configuration management
pub async fn handle_config(
    args: ConfigArgs,
    config: AppConfig,
    config_file: Option<PathBuf>,
) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigAction::Init { path } => {
            let target = path.or(config_file);
            let (path, created) = AppConfig::initialize_first_run(target).await?;
            if created {
                println!("Created default configuration file:");
                println!("   {}", path.display());
            } else {
                println!("Configuration file already exists:");
                println!("   {}", path.display());
            }
            Ok(())
        }
    }
}

/// Apply serve flags on top of file and environment settings
fn apply_serve_args(config: &mut AppConfig, args: &ServeArgs) {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(root) = &args.static_root {
        config.static_files.root = root.clone();
    }
    if args.production {
        config.server.environment = Environment::Production;
    }
}

fn validated_runtime(config: &AppConfig) -> Result<RuntimeConfig> {
    let runtime = config.to_runtime_config();
    runtime.validate()?;
    Ok(runtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;

    #[test]
    fn test_serve_args_override_config() {
        let mut config = AppConfig::default();
        config.server.port = 8080;

        let args = ServeArgs {
            host: Some("127.0.0.1".to_string()),
            port: Some(9090),
            static_root: Some(PathBuf::from("dist")),
            production: true,
        };
        apply_serve_args(&mut config, &args);

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.static_files.root, PathBuf::from("dist"));
        assert_eq!(config.server.environment, Environment::Production);
    }

    #[test]
    fn test_absent_serve_args_keep_config() {
        let mut config = AppConfig::default();
        config.server.port = 8080;

        apply_serve_args(&mut config, &ServeArgs::default());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
    }

    #[tokio::test]
    async fn test_serve_rejects_invalid_config() {
        let mut config = AppConfig::default();
        config.cache.ttl_ms = 0;

        let result = handle_serve(ServeArgs::default(), config).await;
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::ValidationFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_check_fails_on_missing_root() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let args = CheckArgs {
            static_root: Some(temp_dir.path().join("missing")),
        };

        let result = handle_check(args, AppConfig::default()).await;
        assert!(matches!(result, Err(AppError::Startup(_))));
    }
}
