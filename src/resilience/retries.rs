//! Bounded retry with exponential backoff.
//!
//! Every failed attempt is reported to the caller's hook (the fetcher uses it
//! to feed the circuit breaker) and followed by a backoff sleep, including the
//! last one, so a fully failed sequence of 3 attempts at factor 1.5 waits
//! 1.0 + 1.5 + 2.25 = 4.75s in total.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

/// Retry schedule for one upstream fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: f64,
    pub jitter_ratio: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            factor: config.backoff_factor,
            jitter_ratio: config.jitter_ratio,
        }
    }

    /// Sleep that follows failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay, self.factor, self.jitter_ratio)
    }

    /// Fast schedule for tests.
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            factor: 2.0,
            jitter_ratio: 0.0,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Every attempt failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Run `operation` until it succeeds or `policy.max_attempts` attempts have failed.
///
/// `operation` receives the 0-based attempt index. `on_failure` runs right
/// after each failed attempt, before the backoff sleep.
pub async fn retry<F, Fut, T, E, H>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut on_failure: H,
    mut operation: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    H: FnMut(u32, &E),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation = operation_name, retries = attempt, "Operation succeeded after retries");
                }
                return Ok(value);
            }
            Err(err) => {
                on_failure(attempt, &err);

                let delay = policy.delay_for(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_attempts,
                    error = %err,
                    delay = ?delay,
                    "Attempt failed, backing off"
                );
                sleep(delay).await;

                attempt += 1;
                if attempt >= max_attempts {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: err,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[derive(Debug)]
    struct TestError(String);

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_first_try() {
        let result: Result<i32, RetryExhausted<TestError>> =
            retry("test_op", &RetryPolicy::test(), |_, _| {}, |_| async { Ok(42) }).await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let attempts = Arc::new(AtomicU32::new(0));
        let mut failures_seen = Vec::new();

        let result = retry(
            "test_op",
            &RetryPolicy::test(),
            |attempt, _err: &TestError| failures_seen.push(attempt),
            |_| {
                let a = attempts.clone();
                async move {
                    let count = a.fetch_add(1, Ordering::SeqCst) + 1;
                    if count < 3 {
                        Err(TestError(format!("fail {}", count)))
                    } else {
                        Ok(42)
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(failures_seen, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_retry_exhausts_attempts() {
        let attempts = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = retry(
            "test_op",
            &RetryPolicy::test(),
            |_, _| {},
            |_| {
                let a = attempts.clone();
                async move {
                    a.fetch_add(1, Ordering::SeqCst);
                    Err(TestError("always fail".to_string()))
                }
            },
        )
        .await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 3);
        assert!(exhausted.last_error.0.contains("always fail"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_accounting_for_failed_sequence() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), _> = retry(
            "test_op",
            &RetryPolicy::default(),
            |_, _| {},
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError("down".into())) }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let slept = start.elapsed();
        assert!(slept >= Duration::from_millis(4750), "slept {:?}", slept);
        assert!(slept < Duration::from_millis(4760), "slept {:?}", slept);
    }

    #[test]
    fn test_policy_from_default_config() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2250));
    }
}
