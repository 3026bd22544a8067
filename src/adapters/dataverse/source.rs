//! Upstream account source trait
//!
//! The sweep engine talks to the upstream only through [`AccountSource`], so
//! the batching, retry and scheduling logic can run against in-memory fakes.

use crate::domain::{RecordId, Result};
use async_trait::async_trait;
use serde_json::Value;

/// One page of unprocessed account identifiers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdPage {
    /// Identifiers on this page
    pub ids: Vec<RecordId>,

    /// Opaque cursor for the next page; `None` on the last page
    pub next_cursor: Option<String>,
}

impl IdPage {
    /// Create a page
    pub fn new(ids: Vec<RecordId>, next_cursor: Option<String>) -> Self {
        Self { ids, next_cursor }
    }
}

/// Trait for upstream account stores
///
/// # Example
///
/// ```no_run
/// use account_sweep::adapters::dataverse::AccountSource;
///
/// # async fn example(source: &dyn AccountSource) -> account_sweep::domain::Result<()> {
/// let first = source.fetch_id_page(None).await?;
/// let details = source.fetch_details(&first.ids).await?;
/// source.mark_processed(&first.ids).await?;
/// println!("{} accounts on the first page, {} detailed", first.ids.len(), details.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Fetch one page of unprocessed identifiers.
    ///
    /// `cursor` is `None` for the first page and the previous page's
    /// `next_cursor` afterwards.
    async fn fetch_id_page(&self, cursor: Option<&str>) -> Result<IdPage>;

    /// Fetch the fixed field set for exactly `ids`.
    ///
    /// Returns one JSON object per matched account. Accounts that vanished
    /// upstream are simply absent.
    async fn fetch_details(&self, ids: &[RecordId]) -> Result<Vec<Value>>;

    /// Set the processed marker on every id, as one atomic request when the
    /// backend supports it. Any per-id failure fails the whole call.
    async fn mark_processed(&self, ids: &[RecordId]) -> Result<()>;

    /// Human-readable location of the source, for logs
    fn describe(&self) -> String;
}
