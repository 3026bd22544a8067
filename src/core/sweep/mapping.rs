//! Mapping of upstream account objects to [`ExportRecord`]s
//!
//! Every field is read independently. A missing, null or mistyped value
//! leaves the corresponding record field empty and never fails the batch.

use crate::config::DataverseConfig;
use crate::domain::{ExportRecord, RecordId};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// Annotation suffix carrying option-set display labels
pub const FORMATTED_VALUE: &str = "@OData.Community.Display.V1.FormattedValue";

/// Upstream column names used by the mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    pub due_date_field: String,
    pub processed_field: String,
    /// Marker value committed by the write-back
    pub processed_value: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            due_date_field: "new_duedate".to_string(),
            processed_field: "new_processed".to_string(),
            processed_value: "Processed".to_string(),
        }
    }
}

impl FieldMap {
    /// Build from the `[dataverse]` section
    pub fn from_config(config: &DataverseConfig) -> Self {
        Self {
            due_date_field: config.due_date_field.clone(),
            processed_field: config.processed_field.clone(),
            processed_value: config.processed_value.clone(),
        }
    }

    /// The fixed `$select` list for detail fetches
    pub fn select_fields(&self) -> Vec<&str> {
        vec![
            "accountid",
            "name",
            "telephone1",
            "fax",
            "websiteurl",
            "address1_composite",
            "revenue",
            "numberofemployees",
            "preferredcontactmethodcode",
            "industrycode",
            "sic",
            "address1_longitude",
            "address1_latitude",
            "customertypecode",
            &self.due_date_field,
            &self.processed_field,
        ]
    }

    /// Map one account object. Returns `None` when the identifier is absent.
    ///
    /// `processed` holds whatever the upstream returned, which is null for
    /// accounts selected by the default filter. See [`FieldMap::stamp_processed`].
    pub fn map_account(&self, item: &Value) -> Option<ExportRecord> {
        let account_id = text(item, "accountid").and_then(|id| RecordId::new(id).ok())?;

        Some(ExportRecord {
            account_id,
            name: text(item, "name"),
            phone: text(item, "telephone1"),
            fax: text(item, "fax"),
            website: text(item, "websiteurl"),
            address: text(item, "address1_composite"),
            revenue: float(item, "revenue"),
            employees: item.get("numberofemployees").and_then(Value::as_i64),
            preferred_contact: label(item, "preferredcontactmethodcode"),
            industry: label(item, "industrycode"),
            sic: text(item, "sic"),
            longitude: float(item, "address1_longitude"),
            latitude: float(item, "address1_latitude"),
            customer_type: label(item, "customertypecode"),
            due_date: timestamp(item, &self.due_date_field),
            processed: scalar(item, &self.processed_field),
        })
    }

    /// Record the committed marker once the write-back for `record` succeeded
    pub fn stamp_processed(&self, record: &mut ExportRecord) {
        record.processed = Some(self.processed_value.clone());
    }
}

fn text(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(Value::as_str).map(str::to_string)
}

fn float(item: &Value, key: &str) -> Option<f64> {
    item.get(key).and_then(Value::as_f64)
}

/// Any scalar rendered as text; used where the column type varies by org
fn scalar(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Option-set display label, falling back to the raw code
fn label(item: &Value, key: &str) -> Option<String> {
    text(item, &format!("{key}{FORMATTED_VALUE}")).or_else(|| scalar(item, key))
}

/// RFC 3339 timestamps, or date-only values at UTC midnight
fn timestamp(item: &Value, key: &str) -> Option<DateTime<Utc>> {
    let raw = item.get(key)?.as_str()?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
