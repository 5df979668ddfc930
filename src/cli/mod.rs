//! Command-line interface components
//!
//! This module contains CLI-specific code for the cube navigation server,
//! including argument parsing, command handlers and startup verification.

pub mod args;
pub mod commands;
pub mod startup;

pub use args::{CheckArgs, Cli, Commands, ConfigAction, ConfigArgs, GlobalArgs, ServeArgs};
pub use commands::{handle_check, handle_config, handle_serve};
pub use startup::verify_startup;
