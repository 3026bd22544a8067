//! Core business logic for account sweeps.
//!
//! # Modules
//!
//! - [`sweep`] - ID paging, batching, bounded concurrent processing with
//!   retry, and the run orchestrator
//! - [`export`] - CSV artifact generation and run summaries
//!
//! # Sweep Workflow
//!
//! 1. **Authenticate**: Acquire one upstream token to fail fast
//! 2. **Fetch IDs**: Page through every unprocessed account ID
//! 3. **Batch**: Partition the IDs into fixed-size batches
//! 4. **Process**: Per batch, fetch details and mark the accounts processed,
//!    with retry on throttling and at most N batches in flight
//! 5. **Export**: Write the surviving records to one CSV artifact
//! 6. **Report**: Log the run summary
//!
//! # Example
//!
//! ```rust,no_run
//! use account_sweep::config::load_config;
//! use account_sweep::core::sweep::SweepOrchestrator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config(None)?;
//! let orchestrator = SweepOrchestrator::from_config(&config)?;
//!
//! let summary = orchestrator.run().await;
//! println!("{}", summary.message());
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod sweep;
