//! CSV export of aggregated account records
//!
//! One header row followed by one row per record. Empty optional fields are
//! written as empty cells. The artifact name embeds the UTC time to the second.

use crate::adapters::storage::ArtifactStore;
use crate::domain::{ExportRecord, Result, SweepError};
use chrono::{DateTime, SecondsFormat, Utc};
use csv::Writer;
use std::sync::Arc;

/// Column headers, in artifact order
pub const HEADERS: [&str; 16] = [
    "Account ID",
    "Name",
    "Phone",
    "Fax",
    "Website",
    "Address",
    "Revenue",
    "Employees",
    "Preferred Contact",
    "Industry",
    "SIC",
    "Longitude",
    "Latitude",
    "Customer Type",
    "Due Date",
    "Processed",
];

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// `<prefix>_<YYYYMMDD_HHMMSS>.csv`
pub fn artifact_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// Serialize records to CSV bytes
pub fn to_csv(records: &[ExportRecord]) -> Result<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());

    writer
        .write_record(HEADERS)
        .map_err(|e| SweepError::Export(format!("Failed to write CSV header: {e}")))?;

    for record in records {
        writer.write_record(row(record)).map_err(|e| {
            SweepError::Export(format!(
                "Failed to write CSV row for account {}: {e}",
                record.account_id
            ))
        })?;
    }

    writer
        .into_inner()
        .map_err(|e| SweepError::Export(format!("Failed to finish CSV output: {e}")))
}

fn row(record: &ExportRecord) -> [String; 16] {
    [
        record.account_id.to_string(),
        opt(&record.name),
        opt(&record.phone),
        opt(&record.fax),
        opt(&record.website),
        opt(&record.address),
        num(record.revenue),
        record.employees.map(|n| n.to_string()).unwrap_or_default(),
        opt(&record.preferred_contact),
        opt(&record.industry),
        opt(&record.sic),
        num(record.longitude),
        num(record.latitude),
        opt(&record.customer_type),
        record
            .due_date
            .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default(),
        opt(&record.processed),
    ]
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn num(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Serializes records and hands them to an [`ArtifactStore`]
#[derive(Clone)]
pub struct CsvExporter {
    store: Arc<dyn ArtifactStore>,
    prefix: String,
}

impl CsvExporter {
    pub fn new(store: Arc<dyn ArtifactStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Export with a name stamped at the current time.
    ///
    /// Returns the artifact identifier. Never retries; a failed hand-off is
    /// reported as an export-stage error.
    pub async fn export(&self, records: &[ExportRecord]) -> Result<String> {
        self.export_at(records, Utc::now()).await
    }

    /// Export with a name stamped at `at`
    pub async fn export_at(&self, records: &[ExportRecord], at: DateTime<Utc>) -> Result<String> {
        let name = artifact_name(&self.prefix, at);
        let bytes = to_csv(records)?;
        let size = bytes.len();

        let artifact = self.store.put(&name, bytes, CSV_CONTENT_TYPE).await?;

        tracing::info!(
            artifact = %artifact,
            records = records.len(),
            bytes = size,
            "Export artifact stored"
        );

        Ok(artifact)
    }
}
