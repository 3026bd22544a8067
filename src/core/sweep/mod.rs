//! Batch orchestration engine
//!
//! ID paging, partitioning, bounded concurrent batch processing with retry,
//! result aggregation, and the orchestrator that strings them together.

pub mod aggregator;
pub mod batcher;
pub mod mapping;
pub mod orchestrator;
pub mod paginator;
pub mod processor;
pub mod retry;
pub mod scheduler;

pub use aggregator::ResultAggregator;
pub use batcher::{partition, Batch};
pub use mapping::FieldMap;
pub use orchestrator::SweepOrchestrator;
pub use paginator::fetch_all_ids;
pub use processor::BatchProcessor;
pub use retry::{exponential_backoff, retry_with_backoff, RetryEvent, RetryPolicy};
pub use scheduler::{BoundedScheduler, UnitOutcome};
