//! Command-line argument parsing for the cube navigation server
//!
//! This module defines the CLI structure using clap derive macros: running
//! the server, a one-shot filesystem check, and configuration management.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Cube navigation server - serve the single-page app and its backgrounds
#[derive(Parser, Debug)]
#[command(
    name = "cubenav-server",
    version,
    about = "Static file server for the cube navigation app",
    long_about = "Serves the cube navigation single-page application with a history fallback,
security headers, and a self-healing filesystem health probe exposed on /health."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),

    /// Verify the static root once, print the probe report and exit
    Check(CheckArgs),

    /// Show or create the configuration file
    Config(ConfigArgs),
}

/// Arguments for the serve command
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Listening port (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory to serve
    #[arg(long, value_name = "DIR")]
    pub static_root: Option<PathBuf>,

    /// Run in production mode (long max-age for assets)
    #[arg(long)]
    pub production: bool,
}

/// Arguments for the check command
#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Directory to check
    #[arg(long, value_name = "DIR")]
    pub static_root: Option<PathBuf>,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Write a default configuration file if none exists
    Init {
        /// Where to write the file (default: user config directory)
        #[arg(long, value_name = "FILE")]
        path: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Logging level forced by verbosity flags, if any
    ///
    /// Without flags the configured level applies.
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(verbose: bool, very_verbose: bool, quiet: bool) -> GlobalArgs {
        GlobalArgs {
            verbose,
            very_verbose,
            quiet,
            config: None,
        }
    }

    #[test]
    fn test_log_level() {
        let cli_quiet = Cli {
            global: global(false, false, true),
            command: Commands::Check(CheckArgs::default()),
        };
        let cli_very_verbose = Cli {
            global: global(true, true, false),
            command: Commands::Check(CheckArgs::default()),
        };
        let cli_default = Cli {
            global: global(false, false, false),
            command: Commands::Serve(ServeArgs::default()),
        };

        assert_eq!(cli_quiet.log_level(), Some(tracing::Level::ERROR));
        assert_eq!(cli_very_verbose.log_level(), Some(tracing::Level::DEBUG));
        assert_eq!(cli_default.log_level(), None);
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from([
            "cubenav-server",
            "serve",
            "--port",
            "8080",
            "--static-root",
            "dist",
            "--production",
            "-v",
        ])
        .unwrap();

        assert!(cli.global.verbose);
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.static_root, Some(PathBuf::from("dist")));
                assert!(args.production);
                assert!(args.host.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from([
            "cubenav-server",
            "--config",
            "custom.toml",
            "config",
            "init",
            "--path",
            "out.toml",
        ])
        .unwrap();

        assert_eq!(cli.global.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigArgs {
                action: ConfigAction::Init { path: Some(_) }
            })
        ));
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["cubenav-server", "serve", "--port", "99999"]).is_err());
    }
}
