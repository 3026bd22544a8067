//! Bounded retry with exponential backoff
//!
//! [`retry_with_backoff`] takes its classification predicate and backoff
//! function as plain parameters, so there is no shared retry registry.
//! [`RetryPolicy`] binds it to the `[retry]` configuration section and the
//! [`SweepError::is_transient`] classification.

use crate::config::RetryConfig;
use crate::domain::{Result, SweepError};
use std::future::Future;
use std::time::Duration;

/// Emitted before each retry sleep
#[derive(Debug)]
pub struct RetryEvent<'a> {
    /// What is being retried, e.g. `batch 3`
    pub label: &'a str,
    /// Retry number, starting at 1
    pub attempt: u32,
    /// Sleep before the next attempt
    pub delay: Duration,
    /// Error that triggered the retry
    pub error: &'a SweepError,
}

/// `base^n` seconds for the n-th retry (n starts at 1), uncapped.
pub fn exponential_backoff(base: u32) -> impl Fn(u32) -> Duration + Send + Sync + Copy {
    move |retry: u32| Duration::from_secs(u64::from(base).saturating_pow(retry))
}

/// Run `operation` until it succeeds, fails with an error `classify` rejects,
/// or `max_retries` retries have been spent.
///
/// Non-retryable errors are returned unchanged after the first failure. A
/// retryable error that is still failing when retries run out is returned as
/// [`SweepError::RetryExhausted`] wrapping the last error.
pub async fn retry_with_backoff<T, F, Fut, C, B, O>(
    label: &str,
    max_retries: u32,
    mut operation: F,
    classify: C,
    backoff: B,
    observer: O,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    C: Fn(&SweepError) -> bool,
    B: Fn(u32) -> Duration,
    O: Fn(&RetryEvent<'_>),
{
    let mut retries = 0u32;

    loop {
        match operation().await {
            Ok(value) => {
                if retries > 0 {
                    tracing::info!(
                        label = label,
                        attempts = retries + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(e) if !classify(&e) => return Err(e),
            Err(e) if retries >= max_retries => {
                tracing::error!(
                    label = label,
                    attempts = retries + 1,
                    error = %e,
                    "Retries exhausted"
                );
                return Err(SweepError::RetryExhausted {
                    attempts: retries + 1,
                    last: Box::new(e),
                });
            }
            Err(e) => {
                retries += 1;
                let delay = backoff(retries);

                tracing::warn!(
                    label = label,
                    attempt = retries,
                    max_retries = max_retries,
                    delay_secs = delay.as_secs(),
                    error = %e,
                    "Transient failure, retrying with exponential backoff"
                );
                observer(&RetryEvent {
                    label,
                    attempt: retries,
                    delay,
                    error: &e,
                });

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Retry settings bound to the transient-error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries beyond the first attempt
    pub max_retries: u32,
    /// Base of the exponential backoff, in seconds
    pub backoff_base: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: 2,
        }
    }
}

impl RetryPolicy {
    /// Create a policy from the `[retry]` section
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: config.backoff_base,
        }
    }

    /// Run `operation`, retrying transient upstream failures
    pub async fn execute<T, F, Fut, O>(&self, label: &str, operation: F, observer: O) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        O: Fn(&RetryEvent<'_>),
    {
        retry_with_backoff(
            label,
            self.max_retries,
            operation,
            SweepError::is_transient,
            exponential_backoff(self.backoff_base),
            observer,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UpstreamError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn transient() -> SweepError {
        UpstreamError::Transient {
            signature: "429".to_string(),
            message: "Too Many Requests".to_string(),
        }
        .into()
    }

    fn permanent() -> SweepError {
        UpstreamError::ClientError {
            status: 400,
            message: "Bad Request".to_string(),
        }
        .into()
    }

    #[test]
    fn test_exponential_backoff_sequence() {
        let backoff = exponential_backoff(2);
        let delays: Vec<u64> = (1..=4).map(|n| backoff(n).as_secs()).collect();
        assert_eq!(delays, vec![2, 4, 8, 16]);
    }

    #[test]
    fn test_policy_from_config() {
        let config = RetryConfig {
            max_retries: 5,
            backoff_base: 3,
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.backoff_base, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_then_success() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let events = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result = policy
            .execute(
                "unit",
                || {
                    let calls = calls.clone();
                    async move {
                        let mut calls = calls.lock().unwrap();
                        calls.push(Instant::now());
                        if calls.len() <= 3 {
                            Err(transient())
                        } else {
                            Ok(42)
                        }
                    }
                },
                |_| {
                    events.fetch_add(1, Ordering::SeqCst);
                },
            )
            .await;

        assert_eq!(result.unwrap(), 42);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        assert_eq!(events.load(Ordering::SeqCst), 3);

        let gaps: Vec<u64> = calls.windows(2).map(|w| (w[1] - w[0]).as_secs()).collect();
        assert_eq!(gaps, vec![2, 4, 8]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_error_fails_immediately() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<()> = RetryPolicy::default()
            .execute(
                "unit",
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(permanent()) }
                },
                |_| panic!("no retry expected"),
            )
            .await;

        assert!(matches!(result, Err(SweepError::Upstream(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_are_tagged() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = RetryPolicy {
            max_retries: 2,
            backoff_base: 2,
        }
        .execute(
            "unit",
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(transient()) }
            },
            |_| {},
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(SweepError::RetryExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(last.is_transient());
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_sees_attempt_and_delay() {
        let seen = Mutex::new(Vec::new());
        let mut remaining = 2;

        let result = retry_with_backoff(
            "batch 7",
            3,
            || {
                let fail = remaining > 0;
                remaining -= 1;
                async move {
                    if fail {
                        Err(transient())
                    } else {
                        Ok("done")
                    }
                }
            },
            SweepError::is_transient,
            |n| Duration::from_millis(10 * u64::from(n)),
            |event| {
                seen.lock().unwrap().push((
                    event.label.to_string(),
                    event.attempt,
                    event.delay,
                    event.error.is_transient(),
                ));
            },
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("batch 7".to_string(), 1, Duration::from_millis(10), true),
                ("batch 7".to_string(), 2, Duration::from_millis(20), true),
            ]
        );
    }
}
