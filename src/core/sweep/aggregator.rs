//! Concurrently appendable collection of export records

use crate::domain::ExportRecord;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Shared by every batch worker; drained once after all batches finish.
///
/// Appends take a short lock around `Vec::extend`; no lock is held while a
/// batch is in flight.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    records: Mutex<Vec<ExportRecord>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one batch worth of records
    pub fn add(&self, records: Vec<ExportRecord>) {
        self.lock().extend(records);
    }

    /// Number of records collected so far
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every collected record, leaving the aggregator empty
    pub fn drain(&self) -> Vec<ExportRecord> {
        std::mem::take(&mut *self.lock())
    }

    // A panicking writer cannot leave the Vec half-extended, so a poisoned
    // lock still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, Vec<ExportRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
