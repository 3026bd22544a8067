//! Export artifact and run reporting
//!
//! This module provides:
//! - CSV serialization and the hand-off to durable storage
//! - Run summary and reporting

pub mod csv;
pub mod summary;

pub use self::csv::{artifact_name, to_csv, CsvExporter, HEADERS};
pub use summary::{BatchFailure, RunState, RunSummary};
