//! Domain models and types for the sweep.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`RecordId`])
//! - **Export model** ([`ExportRecord`])
//! - **Error types** ([`SweepError`], [`UpstreamError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, SweepError>`]:
//!
//! ```rust
//! use account_sweep::domain::{Result, SweepError};
//!
//! fn example(size: usize) -> Result<usize> {
//!     if size == 0 {
//!         return Err(SweepError::InvalidArgument("size must be positive".to_string()));
//!     }
//!     Ok(size)
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{SweepError, UpstreamError};
pub use ids::RecordId;
pub use record::ExportRecord;
pub use result::Result;
