//! Run summary and reporting
//!
//! This module defines structures for tracking and reporting sweep results.

use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Orchestrator states, in the order a successful run passes through them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Authenticating,
    FetchingIds,
    Batching,
    ProcessingBatches,
    Exporting,
    Succeeded,
    Failed,
}

impl RunState {
    /// Whether the run has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Authenticating => "authenticating",
            RunState::FetchingIds => "fetching_ids",
            RunState::Batching => "batching",
            RunState::ProcessingBatches => "processing_batches",
            RunState::Exporting => "exporting",
            RunState::Succeeded => "succeeded",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A batch that failed after its retries were spent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Zero-based batch index
    pub batch_index: usize,

    /// Number of IDs in the batch
    pub size: usize,

    /// Final error message
    pub message: String,
}

/// Summary of one sweep run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Correlates log lines and telemetry for one run
    pub run_id: Uuid,

    /// Final state; `Succeeded` or `Failed` once the run is over
    pub state: RunState,

    /// State in which a failed run stopped
    pub failed_stage: Option<RunState>,

    /// Unprocessed IDs found upstream
    pub total_ids: usize,

    /// Batches scheduled
    pub batch_count: usize,

    pub succeeded_batches: usize,

    pub failed_batches: usize,

    /// IDs whose processed marker was written (succeeded batches only)
    pub ids_marked_processed: usize,

    /// Data rows in the export artifact
    pub records_exported: usize,

    /// Retries spent across all batches
    pub retries: u32,

    /// Per-batch failures, ordered by batch index
    pub failures: Vec<BatchFailure>,

    /// Artifact identifier (blob URL or file path)
    pub artifact: Option<String>,

    /// Fatal error message of a failed run
    pub error: Option<String>,

    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl RunSummary {
    /// Create a summary for a run that has not started yet
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            state: RunState::Authenticating,
            failed_stage: None,
            total_ids: 0,
            batch_count: 0,
            succeeded_batches: 0,
            failed_batches: 0,
            ids_marked_processed: 0,
            records_exported: 0,
            retries: 0,
            failures: Vec::new(),
            artifact: None,
            error: None,
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a batch failure
    pub fn add_failure(&mut self, failure: BatchFailure) {
        self.failed_batches += 1;
        self.failures.push(failure);
    }

    /// Move to the terminal failure state, remembering where the run stopped
    pub fn fail(&mut self, message: impl Into<String>) {
        self.failed_stage = Some(self.state);
        self.state = RunState::Failed;
        self.error = Some(message.into());
    }

    /// Check if the run succeeded. Batch failures alone do not fail a run.
    pub fn is_successful(&self) -> bool {
        self.state == RunState::Succeeded
    }

    /// Human-readable outcome: the exported count, or the fatal error
    pub fn message(&self) -> String {
        match &self.error {
            Some(error) if !self.is_successful() => error.clone(),
            _ => format!("Exported {} records.", self.records_exported),
        }
    }

    /// Log the summary
    pub fn log_summary(&self) {
        if self.is_successful() {
            tracing::info!(
                run_id = %self.run_id,
                total_ids = self.total_ids,
                batches = self.batch_count,
                succeeded_batches = self.succeeded_batches,
                failed_batches = self.failed_batches,
                records_exported = self.records_exported,
                retries = self.retries,
                artifact = self.artifact.as_deref().unwrap_or(""),
                duration_secs = self.duration.as_secs(),
                "Sweep completed"
            );
        } else {
            tracing::error!(
                run_id = %self.run_id,
                failed_stage = %self.failed_stage.unwrap_or(RunState::Failed),
                total_ids = self.total_ids,
                ids_marked_processed = self.ids_marked_processed,
                error = self.error.as_deref().unwrap_or(""),
                duration_secs = self.duration.as_secs(),
                "Sweep failed"
            );
        }

        if !self.failures.is_empty() {
            tracing::warn!(
                run_id = %self.run_id,
                failed_batches = self.failed_batches,
                "Sweep completed with batch failures; their accounts stay unprocessed"
            );
            for failure in &self.failures {
                tracing::warn!(
                    batch = failure.batch_index,
                    size = failure.size,
                    message = %failure.message,
                    "Batch failure"
                );
            }
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run:               {}", self.run_id)?;
        writeln!(f, "State:             {}", self.state)?;
        writeln!(f, "Unprocessed IDs:   {}", self.total_ids)?;
        writeln!(
            f,
            "Batches:           {} ({} succeeded, {} failed)",
            self.batch_count, self.succeeded_batches, self.failed_batches
        )?;
        writeln!(f, "Retries:           {}", self.retries)?;
        writeln!(f, "Records exported:  {}", self.records_exported)?;
        if let Some(artifact) = &self.artifact {
            writeln!(f, "Artifact:          {artifact}")?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "Error:             {error}")?;
        }
        write!(f, "Duration:          {:.1}s", self.duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_summary_creation() {
        let summary = RunSummary::new(Uuid::new_v4());

        assert_eq!(summary.state, RunState::Authenticating);
        assert_eq!(summary.total_ids, 0);
        assert_eq!(summary.records_exported, 0);
        assert!(summary.failures.is_empty());
        assert!(summary.artifact.is_none());
        assert!(!summary.is_successful());
    }

    #[test]
    fn test_success_message() {
        let mut summary = RunSummary::new(Uuid::new_v4());
        summary.records_exported = 250;
        summary.state = RunState::Succeeded;

        assert!(summary.is_successful());
        assert_eq!(summary.message(), "Exported 250 records.");
    }

    #[test]
    fn test_fail_records_stage() {
        let mut summary = RunSummary::new(Uuid::new_v4());
        summary.state = RunState::FetchingIds;
        summary.fail("Upstream error: Server error: 500 - boom");

        assert_eq!(summary.state, RunState::Failed);
        assert_eq!(summary.failed_stage, Some(RunState::FetchingIds));
        assert_eq!(summary.message(), "Upstream error: Server error: 500 - boom");
        assert!(summary.state.is_terminal());
    }

    #[test]
    fn test_batch_failures_do_not_fail_run() {
        let mut summary = RunSummary::new(Uuid::new_v4());
        summary.add_failure(BatchFailure {
            batch_index: 2,
            size: 50,
            message: "Write-back rejected".to_string(),
        });
        summary.state = RunState::Succeeded;

        assert_eq!(summary.failed_batches, 1);
        assert!(summary.is_successful());
    }

    #[test]
    fn test_with_duration_and_display() {
        let mut summary = RunSummary::new(Uuid::new_v4()).with_duration(Duration::from_secs(90));
        summary.state = RunState::Succeeded;
        summary.artifact = Some("accounts_20240101_000000.csv".to_string());

        assert_eq!(summary.duration, Duration::from_secs(90));
        let text = summary.to_string();
        assert!(text.contains("State:             succeeded"));
        assert!(text.contains("accounts_20240101_000000.csv"));
        assert!(text.ends_with("90.0s"));
    }
}
