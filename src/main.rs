//! Cube navigation server CLI application
//!
//! Serves the single-page application, or checks the static layout once.
//! Exits with status 1 on any startup, bind or configuration failure.

use std::process;

use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use cubenav_server::cli::{handle_check, handle_config, handle_serve, Cli, Commands};
use cubenav_server::config::AppConfig;
use cubenav_server::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        error!("{} error: {}", e.category(), e);
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    let config_file = cli.global.config.clone();
    let config = AppConfig::load(config_file.clone()).await;

    // Logging comes up before a config error is reported
    let level = config
        .as_ref()
        .map(|config| config.logging.level.clone())
        .unwrap_or_else(|_| cubenav_server::constants::logging::DEFAULT_LOG_LEVEL.to_string());
    init_logging(&cli, &level);
    let config = config?;

    info!("cubenav-server v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve(args) => handle_serve(args, config).await,
        Commands::Check(args) => handle_check(args, config).await,
        Commands::Config(args) => handle_config(args, config, config_file).await,
    }
}

/// Initialize logging from CLI verbosity, falling back to the configured level
fn init_logging(cli: &Cli, configured_level: &str) {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| configured_level.to_string());

    let mut filter = EnvFilter::from_default_env();
    match format!("cubenav_server={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log level '{}': {}", level, e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
