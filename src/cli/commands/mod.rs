//! CLI command implementations
//!
//! Exit codes: 0 success, 1 failed sweep or server error, 2 configuration
//! error.

pub mod run;
pub mod serve;
pub mod validate;
