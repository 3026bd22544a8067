// Account Sweep - Dataverse account export
// Copyright (c) 2025 Account Sweep Contributors
// Licensed under the MIT License

//! # Account Sweep - Dataverse account export
//!
//! Account Sweep finds every Dataverse account that has not yet been
//! processed, marks each one processed through batched write-backs, and
//! writes the fetched account details to a CSV artifact on durable storage.
//!
//! ## Overview
//!
//! - **Fetching** the unprocessed account IDs across Web API pages
//! - **Processing** fixed-size batches under a concurrency ceiling, with
//!   exponential backoff on throttling
//! - **Marking** each batch processed with one OData `$batch` request
//! - **Exporting** the surviving records to Azure Blob Storage or a local
//!   directory
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`server`] - HTTP trigger
//! - [`core`] - Batch orchestration engine and export
//! - [`adapters`] - External integrations (Azure AD, Dataverse, storage)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and telemetry
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use account_sweep::config::load_config;
//! use account_sweep::core::sweep::SweepOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config(None)?;
//!     let orchestrator = SweepOrchestrator::from_config(&config)?;
//!
//!     let summary = orchestrator.run().await;
//!     println!("{}", summary.message());
//!     Ok(())
//! }
//! ```
//!
//! ## Failure Model
//!
//! A batch that still fails after its retries is left unprocessed upstream
//! and excluded from the artifact; the run carries on. Authentication, ID
//! fetch and export failures fail the whole run. A crash between write-back
//! and export can mark accounts processed that never reach an artifact, so
//! downstream consumers should treat the export as at-least-once.
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`] with
//! [`domain::SweepError`]:
//!
//! ```rust,no_run
//! use account_sweep::domain::SweepError;
//!
//! fn example() -> Result<(), SweepError> {
//!     let config = account_sweep::config::load_config(None)?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod server;
