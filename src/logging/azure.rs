//! Azure Log Analytics integration
//!
//! Sends sweep telemetry to a Log Analytics workspace through the Logs
//! Ingestion API, using a Data Collection Endpoint (DCE) and Data Collection
//! Rule (DCR). Tokens come from the same identity the sweep already uses.
//!
//! Telemetry is best effort. Callers log a failed send and carry on.
//!
//! # Example
//!
//! ```no_run
//! use account_sweep::adapters::auth::token_source_from_config;
//! use account_sweep::config::load_config;
//! use account_sweep::logging::azure::AzureLogger;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config(None)?;
//! if config.logging.azure_enabled {
//!     let tokens = token_source_from_config(&config.identity)?;
//!     let logger = AzureLogger::new(&config.logging, tokens)?;
//! }
//! # Ok(())
//! # }
//! ```

use crate::adapters::auth::TokenSource;
use crate::config::LoggingConfig;
use crate::core::export::{BatchFailure, RunSummary};
use crate::domain::{Result, SweepError};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Scope for the Logs Ingestion API
pub const MONITOR_SCOPE: &str = "https://monitor.azure.com/.default";

/// Logs Ingestion API version
const INGESTION_API_VERSION: &str = "2023-01-01";

/// Azure logger for Log Analytics using Logs Ingestion API
pub struct AzureLogger {
    tokens: Arc<dyn TokenSource>,
    /// Data Collection Rule (DCR) immutable ID
    dcr_immutable_id: String,
    /// Data Collection Endpoint (DCE) URL
    dce_endpoint: String,
    /// Stream name for custom logs (e.g., "Custom-AccountSweep_CL")
    stream_name: String,
    http_client: reqwest::Client,
}

impl AzureLogger {
    /// Create a new Azure logger from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if Azure logging is not enabled or a required setting
    /// is missing
    pub fn new(config: &LoggingConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        if !config.azure_enabled {
            return Err(SweepError::Configuration(
                "Azure logging is not enabled".to_string(),
            ));
        }

        let dcr_immutable_id = required(&config.azure_dcr_immutable_id, "azure_dcr_immutable_id")?;
        let dce_endpoint = required(&config.azure_dce_endpoint, "azure_dce_endpoint")?;
        let stream_name = required(&config.azure_stream_name, "azure_stream_name")?;

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                SweepError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        info!(
            dcr_id = %dcr_immutable_id,
            stream = %stream_name,
            "Azure Log Analytics logger initialized"
        );

        Ok(Self {
            tokens,
            dcr_immutable_id,
            dce_endpoint,
            stream_name,
            http_client,
        })
    }

    fn ingestion_url(&self) -> String {
        format!(
            "{}/dataCollectionRules/{}/streams/{}?api-version={INGESTION_API_VERSION}",
            self.dce_endpoint.trim_end_matches('/'),
            self.dcr_immutable_id,
            self.stream_name
        )
    }

    /// Send log records to Azure Log Analytics via Logs Ingestion API
    async fn send_logs(&self, records: Value) -> Result<()> {
        let token = self
            .tokens
            .token(MONITOR_SCOPE)
            .await
            .map_err(|e| SweepError::AzureLogging(format!("Failed to acquire token: {e}")))?;

        let url = self.ingestion_url();
        let record_count = records.as_array().map(Vec::len).unwrap_or(0);

        debug!(url = %url, record_count = record_count, "Sending logs to Azure Log Analytics");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(&records)
            .send()
            .await
            .map_err(|e| SweepError::AzureLogging(format!("Failed to send logs to Azure: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, record_count = record_count, "Sent logs to Azure Log Analytics");
            Ok(())
        } else {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                status = %status,
                error = %error_body,
                "Failed to send logs to Azure Log Analytics"
            );
            Err(SweepError::AzureLogging(format!(
                "Azure Log Analytics API returned status {status}: {error_body}"
            )))
        }
    }

    /// Record the outcome of a run
    pub async fn log_run_summary(&self, summary: &RunSummary) -> Result<()> {
        let record = json!([{
            "TimeGenerated": Utc::now().to_rfc3339(),
            "OperationType": "sweep_run",
            "RunId": summary.run_id.to_string(),
            "Status": summary.state.to_string(),
            "FailedStage": summary.failed_stage.map(|s| s.to_string()).unwrap_or_default(),
            "TotalIds": summary.total_ids,
            "BatchCount": summary.batch_count,
            "FailedBatches": summary.failed_batches,
            "RecordsExported": summary.records_exported,
            "Retries": summary.retries,
            "Artifact": summary.artifact.as_deref().unwrap_or(""),
            "ErrorMessage": summary.error.as_deref().unwrap_or(""),
            "DurationMs": u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
        }]);

        self.send_logs(record).await
    }

    /// Record one batch that failed after its retries
    pub async fn log_batch_failure(&self, run_id: Uuid, failure: &BatchFailure) -> Result<()> {
        let record = json!([{
            "TimeGenerated": Utc::now().to_rfc3339(),
            "OperationType": "batch_failed",
            "RunId": run_id.to_string(),
            "Status": "failed",
            "BatchIndex": failure.batch_index,
            "BatchSize": failure.size,
            "ErrorMessage": failure.message,
        }]);

        self.send_logs(record).await
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    value.clone().filter(|v| !v.is_empty()).ok_or_else(|| {
        SweepError::Configuration(format!("{name} is required when Azure logging is enabled"))
    })
}
