//! Validate config command implementation
//!
//! This module implements the `validate-config` command.

use crate::config::SweepConfig;
use crate::domain::SweepError;
use clap::Args;
use std::path::Path;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command.
    ///
    /// `loaded` is the outcome of loading `config_path` plus the environment;
    /// loading already ran validation.
    pub fn execute(
        &self,
        config_path: Option<&Path>,
        loaded: Result<&SweepConfig, &SweepError>,
    ) -> i32 {
        match config_path {
            Some(path) => println!("Validating configuration file: {}", path.display()),
            None => println!("Validating configuration from defaults and environment"),
        }
        println!();

        let config = match loaded {
            Ok(c) => c,
            Err(e) => {
                println!("Configuration is invalid");
                println!("   Error: {e}");
                return 2;
            }
        };

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dataverse API: {}", config.dataverse.api_root());
        println!("  Unprocessed Filter: {}", config.dataverse.effective_filter());
        println!(
            "  Identity: {}",
            if config.identity.uses_static_token() {
                "static token"
            } else {
                "Azure AD client credentials"
            }
        );
        println!("  Batch Size: {}", config.processing.batch_size);
        println!(
            "  Max Concurrent Batches: {}",
            config.processing.max_concurrent_batches
        );
        println!("  Pacing Delay: {}ms", config.processing.pacing_delay_ms);
        println!(
            "  Retries: {} (backoff base {}s)",
            config.retry.max_retries, config.retry.backoff_base
        );
        println!(
            "  Storage: {:?} {} / {}",
            config.storage.backend, config.storage.target, config.storage.container
        );
        println!("  HTTP Trigger: {}", config.server.bind_address);
        println!();
        0
    }
}
