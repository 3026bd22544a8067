//! Domain identifier types with validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source record identifier newtype wrapper
///
/// Opaque, immutable identifier of one upstream account. Dataverse uses
/// GUIDs, but nothing here depends on the format beyond being non-empty.
///
/// # Examples
///
/// ```
/// use account_sweep::domain::ids::RecordId;
/// use std::str::FromStr;
///
/// let id = RecordId::from_str("4f2c9a8e-6b1d-4e2f-9c3a-7d8e1f0a2b3c").unwrap();
/// assert_eq!(id.as_str(), "4f2c9a8e-6b1d-4e2f-9c3a-7d8e1f0a2b3c");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new RecordId, rejecting blank identifiers
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Record ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the record ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
