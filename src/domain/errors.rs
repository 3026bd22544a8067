//! Domain error types
//!
//! This module defines the error hierarchy for the sweep. Errors never expose
//! third-party types; HTTP and SDK failures are converted to strings at the
//! adapter boundary.

use thiserror::Error;

/// Main sweep error type
///
/// Stage-level failures (authentication, ID fetch, export) are fatal for a
/// run. Batch-level failures are absorbed by the orchestrator.
#[derive(Debug, Error)]
pub enum SweepError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid argument passed to a core operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Token acquisition failure
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Upstream (Dataverse) failures
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// A transient failure persisted through every retry
    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetryExhausted {
        /// Total attempts made (first try included)
        attempts: u32,
        /// The error raised by the final attempt
        #[source]
        last: Box<SweepError>,
    },

    /// Serialization of the export artifact failed
    #[error("Export error: {0}")]
    Export(String),

    /// Durable storage hand-off failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Azure logging errors
    #[error("Azure logging error: {0}")]
    AzureLogging(String),

    /// A unit of work panicked or was aborted
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SweepError {
    /// Whether this error is safe to retry.
    ///
    /// Only [`UpstreamError::Transient`] qualifies; every other variant,
    /// including an already exhausted retry, propagates immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, SweepError::Upstream(UpstreamError::Transient { .. }))
    }

    /// Whether this error counts as an export-stage failure
    pub fn is_export_failure(&self) -> bool {
        matches!(self, SweepError::Export(_) | SweepError::Storage(_))
    }
}

/// Upstream-specific errors
///
/// Errors that occur while talking to the Dataverse Web API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Rate limiting, service busy, or network-level failure
    #[error("Transient upstream failure ({signature}): {message}")]
    Transient {
        /// Short classification, e.g. `429`, `503`, `connect`, `0x80072322`
        signature: String,
        /// Error detail
        message: String,
    },

    /// Client error (4xx other than 429)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Server error (5xx other than 503)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Response body could not be understood
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// The batched write-back changeset reported a failing operation
    #[error("Write-back rejected: {0}")]
    WriteBackRejected(String),

    /// Request could not be built or sent for a non-network reason
    #[error("Request failed: {0}")]
    RequestFailed(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for SweepError {
    fn from(err: std::io::Error) -> Self {
        SweepError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SweepError {
    fn from(err: serde_json::Error) -> Self {
        SweepError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SweepError {
    fn from(err: toml::de::Error) -> Self {
        SweepError::Configuration(format!("TOML parse error: {err}"))
    }
}
