//! Per-batch fetch, map and write-back

use super::batcher::Batch;
use super::mapping::FieldMap;
use crate::adapters::dataverse::AccountSource;
use crate::domain::{ExportRecord, Result};
use std::sync::Arc;

/// Processes one batch: detail fetch, mapping, then write-back.
///
/// Records are returned only when the write-back for the same batch has
/// succeeded. A failed write-back discards everything fetched for the batch.
#[derive(Clone)]
pub struct BatchProcessor {
    source: Arc<dyn AccountSource>,
    fields: FieldMap,
}

impl BatchProcessor {
    /// Create a new batch processor
    pub fn new(source: Arc<dyn AccountSource>, fields: FieldMap) -> Self {
        Self { source, fields }
    }

    /// Process a batch
    pub async fn process(&self, batch: &Batch) -> Result<Vec<ExportRecord>> {
        let items = self.source.fetch_details(&batch.ids).await?;

        let mut records = Vec::with_capacity(items.len());
        for item in &items {
            match self.fields.map_account(item) {
                Some(record) => records.push(record),
                None => tracing::warn!(
                    batch = batch.index,
                    "Skipping detail row without an account identifier"
                ),
            }
        }

        if records.len() < batch.len() {
            tracing::warn!(
                batch = batch.index,
                requested = batch.len(),
                returned = records.len(),
                "Fewer detail rows than requested IDs; all IDs will still be marked processed"
            );
        }

        if let Err(e) = self.source.mark_processed(&batch.ids).await {
            tracing::warn!(
                batch = batch.index,
                discarded = records.len(),
                error = %e,
                "Write-back failed, discarding fetched records"
            );
            return Err(e);
        }

        for record in &mut records {
            self.fields.stamp_processed(record);
        }

        tracing::debug!(batch = batch.index, records = records.len(), "Batch processed");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::dataverse::IdPage;
    use crate::domain::{RecordId, SweepError, UpstreamError};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedSource {
        fail_write_back: bool,
        extra_rows: Vec<Value>,
        marked: Mutex<Vec<RecordId>>,
    }

    #[async_trait]
    impl AccountSource for ScriptedSource {
        async fn fetch_id_page(&self, _cursor: Option<&str>) -> Result<IdPage> {
            Ok(IdPage::default())
        }

        async fn fetch_details(&self, ids: &[RecordId]) -> Result<Vec<Value>> {
            let mut rows: Vec<Value> = ids
                .iter()
                .skip(1)
                .map(|id| json!({"accountid": id.as_str(), "name": format!("Account {id}")}))
                .collect();
            rows.extend(self.extra_rows.iter().cloned());
            Ok(rows)
        }

        async fn mark_processed(&self, ids: &[RecordId]) -> Result<()> {
            if self.fail_write_back {
                return Err(UpstreamError::WriteBackRejected("changeset failed".to_string()).into());
            }
            self.marked.lock().unwrap().extend(ids.iter().cloned());
            Ok(())
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn batch(n: usize) -> Batch {
        Batch {
            index: 0,
            ids: (0..n)
                .map(|i| RecordId::new(format!("acc-{i}")).unwrap())
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_records_returned_after_write_back() {
        let source = Arc::new(ScriptedSource::default());
        let processor = BatchProcessor::new(source.clone(), FieldMap::default());

        let records = processor.process(&batch(4)).await.unwrap();

        // The scripted source omits the first ID from its detail rows
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name.as_deref(), Some("Account acc-1"));
        assert!(records.iter().all(|r| r.processed.as_deref() == Some("Processed")));
        assert_eq!(source.marked.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_write_back_discards_records() {
        let source = Arc::new(ScriptedSource {
            fail_write_back: true,
            ..Default::default()
        });
        let processor = BatchProcessor::new(source, FieldMap::default());

        let result = processor.process(&batch(4)).await;
        assert!(matches!(
            result,
            Err(SweepError::Upstream(UpstreamError::WriteBackRejected(_)))
        ));
    }

    #[tokio::test]
    async fn test_rows_without_identifier_are_skipped() {
        let source = Arc::new(ScriptedSource {
            extra_rows: vec![json!({"name": "orphan"})],
            ..Default::default()
        });
        let processor = BatchProcessor::new(source, FieldMap::default());

        let records = processor.process(&batch(2)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].account_id.as_str(), "acc-1");
    }
}
