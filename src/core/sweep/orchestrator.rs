//! Sweep orchestrator - end-to-end run of one sweep
//!
//! Drives a run through `Authenticating -> FetchingIds -> Batching ->
//! ProcessingBatches -> Exporting -> Succeeded`. Any error outside the batch
//! loop moves the run to `Failed` and skips the remaining stages. Batches that
//! fail after their retries are recorded in the summary and left out of the
//! export; they never fail the run on their own.

use super::aggregator::ResultAggregator;
use super::batcher::{partition, Batch};
use super::mapping::FieldMap;
use super::paginator::fetch_all_ids;
use super::processor::BatchProcessor;
use super::retry::RetryPolicy;
use super::scheduler::{BoundedScheduler, UnitOutcome};
use crate::adapters::auth::{token_source_from_config, TokenSource};
use crate::adapters::dataverse::{AccountSource, DataverseClient};
use crate::adapters::storage::{create_artifact_store, ArtifactStore};
use crate::config::SweepConfig;
use crate::core::export::{BatchFailure, CsvExporter, RunState, RunSummary};
use crate::domain::{Result, SweepError};
use crate::logging::azure::AzureLogger;
use crate::{log_batch_failure, log_error_with_context, log_stage};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

/// Runs sweeps against one account source and one artifact store
pub struct SweepOrchestrator {
    tokens: Arc<dyn TokenSource>,
    scope: String,
    source: Arc<dyn AccountSource>,
    processor: BatchProcessor,
    exporter: CsvExporter,
    batch_size: usize,
    scheduler: BoundedScheduler,
    retry: RetryPolicy,
    telemetry: Option<Arc<AzureLogger>>,
}

impl SweepOrchestrator {
    /// Create an orchestrator over explicit adapters
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the batch size or concurrency ceiling
    /// is zero.
    pub fn new(
        config: &SweepConfig,
        tokens: Arc<dyn TokenSource>,
        source: Arc<dyn AccountSource>,
        store: Arc<dyn ArtifactStore>,
    ) -> Result<Self> {
        let processing = &config.processing;
        if processing.batch_size == 0 {
            return Err(SweepError::InvalidArgument(
                "processing.batch_size must be greater than 0".to_string(),
            ));
        }

        let scheduler = BoundedScheduler::new(
            processing.max_concurrent_batches,
            Duration::from_millis(processing.pacing_delay_ms),
        )?;

        Ok(Self {
            tokens,
            scope: config.dataverse.token_scope(),
            processor: BatchProcessor::new(
                source.clone(),
                FieldMap::from_config(&config.dataverse),
            ),
            source,
            exporter: CsvExporter::new(store, config.storage.artifact_prefix.clone()),
            batch_size: processing.batch_size,
            scheduler,
            retry: RetryPolicy::from_config(&config.retry),
            telemetry: None,
        })
    }

    /// Build the production adapters (Azure AD, Dataverse, configured store)
    /// and optional Log Analytics telemetry from configuration
    pub fn from_config(config: &SweepConfig) -> Result<Self> {
        let tokens = token_source_from_config(&config.identity)?;
        let source = Arc::new(DataverseClient::new(&config.dataverse, tokens.clone())?);
        let store = create_artifact_store(&config.storage, tokens.clone())?;

        let orchestrator = Self::new(config, tokens.clone(), source, store)?;

        if config.logging.azure_enabled {
            let logger = AzureLogger::new(&config.logging, tokens)?;
            return Ok(orchestrator.with_telemetry(Arc::new(logger)));
        }

        Ok(orchestrator)
    }

    /// Attach Log Analytics telemetry
    pub fn with_telemetry(mut self, telemetry: Arc<AzureLogger>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Execute one sweep.
    ///
    /// Never returns an error: a fatal failure is reported through
    /// [`RunSummary::error`] with the state set to `Failed`.
    pub async fn run(&self) -> RunSummary {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("sweep", run_id = %run_id);
        self.run_with_id(run_id).instrument(span).await
    }

    async fn run_with_id(&self, run_id: Uuid) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::new(run_id);

        tracing::info!(
            source = %self.source.describe(),
            batch_size = self.batch_size,
            max_concurrent = self.scheduler.max_concurrent(),
            "Starting sweep"
        );

        match self.drive(&mut summary).await {
            Ok(()) => summary.state = RunState::Succeeded,
            Err(e) => {
                log_error_with_context!(&e, summary.state);
                let message = fatal_message(&summary, &e);
                summary.fail(message);
            }
        }

        summary.duration = started.elapsed();
        summary.log_summary();

        if let Some(telemetry) = &self.telemetry {
            if let Err(e) = telemetry.log_run_summary(&summary).await {
                tracing::warn!(error = %e, "Failed to send run telemetry");
            }
        }

        summary
    }

    async fn drive(&self, summary: &mut RunSummary) -> Result<()> {
        log_stage!(RunState::Authenticating);
        self.tokens.token(&self.scope).await?;

        advance(summary, RunState::FetchingIds);
        let ids = fetch_all_ids(self.source.as_ref()).await?;
        summary.total_ids = ids.len();

        advance(summary, RunState::Batching);
        let batches = partition(&ids, self.batch_size)?;
        summary.batch_count = batches.len();

        advance(summary, RunState::ProcessingBatches);
        let aggregator = Arc::new(ResultAggregator::new());
        self.process_batches(&batches, &aggregator, summary).await?;

        advance(summary, RunState::Exporting);
        let records = aggregator.drain();
        let artifact = self.exporter.export(&records).await?;
        summary.records_exported = records.len();
        summary.artifact = Some(artifact);

        Ok(())
    }

    async fn process_batches(
        &self,
        batches: &[Batch],
        aggregator: &Arc<ResultAggregator>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let retries = Arc::new(AtomicU32::new(0));

        let units: Vec<_> = batches
            .iter()
            .cloned()
            .map(|batch| {
                let processor = self.processor.clone();
                let retry = self.retry;
                let aggregator = aggregator.clone();
                let retries = retries.clone();
                async move {
                    let label = format!("batch {}", batch.index);
                    let records = retry
                        .execute(
                            &label,
                            || processor.process(&batch),
                            |_| {
                                retries.fetch_add(1, Ordering::Relaxed);
                            },
                        )
                        .await?;
                    let count = records.len();
                    aggregator.add(records);
                    Ok(count)
                }
            })
            .collect();

        let outcomes = self.scheduler.run_all(units).await?;
        summary.retries = retries.load(Ordering::Relaxed);

        for (batch, outcome) in batches.iter().zip(outcomes) {
            match outcome {
                UnitOutcome::Succeeded(count) => {
                    tracing::debug!(batch = batch.index, records = count, "Batch succeeded");
                    summary.succeeded_batches += 1;
                    summary.ids_marked_processed += batch.len();
                }
                UnitOutcome::Failed(e) => {
                    log_batch_failure!(batch.index, batch.len(), &e);
                    let failure = BatchFailure {
                        batch_index: batch.index,
                        size: batch.len(),
                        message: e.to_string(),
                    };
                    if let Some(telemetry) = &self.telemetry {
                        if let Err(e) = telemetry.log_batch_failure(summary.run_id, &failure).await
                        {
                            tracing::warn!(error = %e, "Failed to send batch failure telemetry");
                        }
                    }
                    summary.add_failure(failure);
                }
            }
        }

        tracing::info!(
            succeeded = summary.succeeded_batches,
            failed = summary.failed_batches,
            retries = summary.retries,
            records = aggregator.len(),
            "All batches completed"
        );

        Ok(())
    }
}

fn advance(summary: &mut RunSummary, state: RunState) {
    summary.state = state;
    log_stage!(state, total_ids = summary.total_ids);
}

/// The fatal error text, noting accounts that were marked processed upstream
/// but never reached an artifact
fn fatal_message(summary: &RunSummary, error: &SweepError) -> String {
    if summary.state == RunState::Exporting && summary.ids_marked_processed > 0 {
        format!(
            "{error} ({} accounts were marked processed but not exported)",
            summary.ids_marked_processed
        )
    } else {
        error.to_string()
    }
}
