//! Bounded-concurrency execution of independent units of work

use crate::domain::{Result, SweepError};
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Outcome of one scheduled unit
#[derive(Debug)]
pub enum UnitOutcome<T> {
    Succeeded(T),
    Failed(SweepError),
}

impl<T> UnitOutcome<T> {
    /// Whether the unit succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, UnitOutcome::Succeeded(_))
    }
}

/// Runs units with at most `max_concurrent` in flight.
///
/// A slot is taken before a unit starts and released only after the unit has
/// finished and the pacing delay has elapsed. Units start in submission
/// order. A failing or panicking unit never cancels its siblings.
#[derive(Debug, Clone)]
pub struct BoundedScheduler {
    max_concurrent: usize,
    pacing: Duration,
}

impl BoundedScheduler {
    /// Create a scheduler
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::InvalidArgument`] when `max_concurrent` is zero.
    pub fn new(max_concurrent: usize, pacing: Duration) -> Result<Self> {
        if max_concurrent == 0 {
            return Err(SweepError::InvalidArgument(
                "max concurrent units must be a positive integer".to_string(),
            ));
        }
        Ok(Self {
            max_concurrent,
            pacing,
        })
    }

    /// Concurrency ceiling
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Pacing delay held after each unit
    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Run every unit to completion and return their outcomes in submission
    /// order.
    pub async fn run_all<T, Fut>(&self, units: Vec<Fut>) -> Result<Vec<UnitOutcome<T>>>
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::with_capacity(units.len());

        for (index, unit) in units.into_iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| SweepError::Internal(format!("scheduler gate closed: {e}")))?;
            let pacing = self.pacing;

            tracing::trace!(unit = index, "Unit admitted");

            handles.push(tokio::spawn(async move {
                let result = unit.await;
                tokio::time::sleep(pacing).await;
                drop(permit);
                result
            }));
        }

        let outcomes = join_all(handles)
            .await
            .into_iter()
            .enumerate()
            .map(|(index, joined)| match joined {
                Ok(Ok(value)) => UnitOutcome::Succeeded(value),
                Ok(Err(e)) => UnitOutcome::Failed(e),
                Err(join_err) => {
                    tracing::error!(unit = index, error = %join_err, "Unit panicked");
                    UnitOutcome::Failed(SweepError::Internal(format!(
                        "unit {index} did not complete: {join_err}"
                    )))
                }
            })
            .collect();

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UpstreamError;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Unit = Pin<Box<dyn Future<Output = Result<usize>> + Send>>;

    struct Gauge {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Gauge {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            })
        }

        fn enter(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }

        fn leave(&self) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn tracked_unit(gauge: Arc<Gauge>, value: usize, work: Duration) -> Unit {
        Box::pin(async move {
            gauge.enter();
            tokio::time::sleep(work).await;
            gauge.leave();
            Ok(value)
        })
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = BoundedScheduler::new(0, Duration::ZERO);
        assert!(matches!(result, Err(SweepError::InvalidArgument(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ceiling_is_never_exceeded() {
        let gauge = Gauge::new();
        let scheduler = BoundedScheduler::new(3, Duration::from_millis(100)).unwrap();

        let units: Vec<Unit> = (0..10)
            .map(|i| tracked_unit(gauge.clone(), i, Duration::from_millis(50 + 10 * i as u64)))
            .collect();
        let outcomes = scheduler.run_all(units).await.unwrap();

        assert_eq!(outcomes.len(), 10);
        assert!(outcomes.iter().all(UnitOutcome::is_success));
        assert_eq!(gauge.peak.load(Ordering::SeqCst), 3);
        assert_eq!(gauge.current.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcomes_in_submission_order() {
        let scheduler = BoundedScheduler::new(4, Duration::ZERO).unwrap();
        let units: Vec<Unit> = (0..6)
            .map(|i| -> Unit {
                Box::pin(async move {
                    // Later units finish first
                    tokio::time::sleep(Duration::from_millis(100 - 10 * i as u64)).await;
                    Ok(i)
                })
            })
            .collect();

        let values: Vec<usize> = scheduler
            .run_all(units)
            .await
            .unwrap()
            .into_iter()
            .map(|o| match o {
                UnitOutcome::Succeeded(v) => v,
                UnitOutcome::Failed(e) => panic!("unexpected failure: {e}"),
            })
            .collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_and_panics_do_not_cancel_siblings() {
        let completed = Arc::new(AtomicUsize::new(0));
        let scheduler = BoundedScheduler::new(2, Duration::from_millis(10)).unwrap();

        let units: Vec<Unit> = (0..5)
            .map(|i| -> Unit {
                let completed = completed.clone();
                Box::pin(async move {
                    match i {
                        1 => Err(SweepError::Upstream(UpstreamError::ServerError {
                            status: 500,
                            message: "boom".to_string(),
                        })),
                        3 => panic!("unit exploded"),
                        _ => {
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            completed.fetch_add(1, Ordering::SeqCst);
                            Ok(i)
                        }
                    }
                })
            })
            .collect();

        let outcomes = scheduler.run_all(units).await.unwrap();

        assert_eq!(completed.load(Ordering::SeqCst), 3);
        let successes: Vec<bool> = outcomes.iter().map(UnitOutcome::is_success).collect();
        assert_eq!(successes, vec![true, false, true, false, true]);
        assert!(matches!(
            outcomes[3],
            UnitOutcome::Failed(SweepError::Internal(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_holds_the_slot() {
        let scheduler = BoundedScheduler::new(1, Duration::from_secs(1)).unwrap();
        let start = tokio::time::Instant::now();

        let units: Vec<Unit> = (0..3).map(|i| -> Unit { Box::pin(async move { Ok(i) }) }).collect();
        scheduler.run_all(units).await.unwrap();

        // Three instant units, one slot, one second of pacing each
        assert_eq!(start.elapsed().as_secs(), 3);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let scheduler = BoundedScheduler::new(5, Duration::from_secs(1)).unwrap();
        let outcomes = scheduler.run_all(Vec::<Unit>::new()).await.unwrap();
        assert!(outcomes.is_empty());
    }
}
