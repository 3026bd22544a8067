//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Account Sweep using clap.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Configuration file picked up from the working directory when `--config`
/// is not given
pub const DEFAULT_CONFIG_FILE: &str = "account-sweep.toml";

/// Account Sweep - Dataverse account export
#[derive(Parser, Debug)]
#[command(name = "account-sweep")]
#[command(version, about, long_about = None)]
#[command(author = "Account Sweep Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "SWEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SWEEP_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The configuration file to load, if any.
    ///
    /// Without `--config`, [`DEFAULT_CONFIG_FILE`] is used when it exists;
    /// otherwise configuration comes from defaults and the environment.
    pub fn config_path(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => Some(path.clone()),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                fallback.exists().then_some(fallback)
            }
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP trigger
    Serve(commands::serve::ServeArgs),

    /// Run one sweep and print its summary
    Run(commands::run::RunArgs),

    /// Validate configuration
    ValidateConfig(commands::validate::ValidateArgs),
}
