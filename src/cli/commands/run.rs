//! Run command implementation
//!
//! Executes one sweep in the foreground and prints its summary.

use crate::config::SweepConfig;
use crate::core::sweep::SweepOrchestrator;
use clap::Args;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, config: &SweepConfig) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");

        let orchestrator = match SweepOrchestrator::from_config(config) {
            Ok(o) => o,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize sweep");
                eprintln!("Failed to initialize sweep: {e}");
                return Ok(2);
            }
        };

        let summary = orchestrator.run().await;

        println!("{summary}");
        if !summary.failures.is_empty() {
            println!();
            println!("Failed batches (accounts left unprocessed):");
            for failure in &summary.failures {
                println!(
                    "  batch {} ({} ids): {}",
                    failure.batch_index, failure.size, failure.message
                );
            }
        }

        Ok(if summary.is_successful() { 0 } else { 1 })
    }
}
