//! Result type alias for the sweep
//!
//! This module provides a convenient Result type alias that uses SweepError
//! as the error type.

use super::errors::SweepError;

/// Result type alias for sweep operations
///
/// # Examples
///
/// ```
/// use account_sweep::domain::result::Result;
/// use account_sweep::domain::errors::SweepError;
///
/// fn failing_function() -> Result<()> {
///     Err(SweepError::InvalidArgument("batch size must be positive".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, SweepError>;
