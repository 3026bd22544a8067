//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output plus an optional JSON rolling file
//! - Configurable log levels with `RUST_LOG` taking precedence
//! - Azure Log Analytics telemetry for run outcomes
//!
//! # Example
//!
//! ```no_run
//! use account_sweep::logging::init_logging;
//! use account_sweep::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod azure;
pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log an orchestrator state transition
///
/// # Example
///
/// ```no_run
/// use account_sweep::log_stage;
/// use account_sweep::core::export::RunState;
///
/// log_stage!(RunState::FetchingIds);
/// log_stage!(RunState::Batching, total_ids = 250);
/// ```
#[macro_export]
macro_rules! log_stage {
    ($state:expr) => {
        tracing::info!(state = %$state, "Entering stage");
    };
    ($state:expr, $($field:tt)+) => {
        tracing::info!(state = %$state, $($field)+, "Entering stage");
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use account_sweep::log_error_with_context;
/// use account_sweep::domain::SweepError;
///
/// let error = SweepError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = %$context,
            "Error occurred"
        );
    };
}

/// Log a batch that is still failing after its retries
///
/// # Example
///
/// ```no_run
/// use account_sweep::log_batch_failure;
///
/// log_batch_failure!(2, 100, "Retries exhausted");
/// ```
#[macro_export]
macro_rules! log_batch_failure {
    ($index:expr, $size:expr, $error:expr) => {
        tracing::error!(
            batch = $index,
            size = $size,
            error = %$error,
            "Batch failed; its accounts stay unprocessed"
        );
    };
}
