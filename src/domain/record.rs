//! Export record model
//!
//! An [`ExportRecord`] is the flattened projection of one account. It is
//! created once per account per successful batch and never mutated after.

use super::ids::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flattened account row destined for the export artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub account_id: RecordId,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub revenue: Option<f64>,
    pub employees: Option<i64>,
    /// Display label of the preferred contact method option set
    pub preferred_contact: Option<String>,
    /// Display label of the industry option set
    pub industry: Option<String>,
    pub sic: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    /// Display label of the customer type option set
    pub customer_type: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    /// Processed-marker value as read from the source
    pub processed: Option<String>,
}

impl ExportRecord {
    /// Creates a record with only the identifier set
    pub fn new(account_id: RecordId) -> Self {
        Self {
            account_id,
            name: None,
            phone: None,
            fax: None,
            website: None,
            address: None,
            revenue: None,
            employees: None,
            preferred_contact: None,
            industry: None,
            sic: None,
            longitude: None,
            latitude: None,
            customer_type: None,
            due_date: None,
            processed: None,
        }
    }

    /// Sets the account name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
