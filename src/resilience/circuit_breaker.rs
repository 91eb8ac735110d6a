//! Circuit breaker guarding the upstream source.
//!
//! # States
//! - Closed: normal operation, attempts pass through
//! - Open: upstream assumed down, callers are served fallback without trying
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= threshold at the end of an exhausted retry sequence
//! Open → Closed: at the start of the next call, once reset_timeout has passed
//!                since the last failure (failure_count resets to 0)
//! ```
//!
//! # Design Decisions
//! - One breaker per fetch context, shared by every key
//! - Pull-based: the cool-down is evaluated when a call arrives, never by a timer
//! - All fields sit behind one narrow lock so concurrent callers never see a
//!   half-updated state

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Circuit breaker state for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
        }
    }
}

/// Decision taken at the start of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Circuit closed; go ahead.
    Allowed,
    /// Circuit was open but has cooled down; it is now closed and counters reset.
    Reset,
    /// Circuit open and still cooling down; do not call upstream.
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Admission::Rejected { .. })
    }
}

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    open: bool,
    last_failure: Option<Instant>,
}

/// Read-only view of the breaker for health reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub open: bool,
    pub failure_count: u32,
    /// Seconds since the most recent failed attempt, if any.
    pub last_failure_age_secs: Option<f64>,
}

/// Global failure counter with an open/closed flag and lazy timed reset.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    reset_timeout: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            reset_timeout,
            state: Mutex::new(BreakerState::default()),
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(config.failure_threshold, config.reset_timeout())
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evaluate the breaker for a new call, closing it if the cool-down has elapsed.
    pub fn admit(&self) -> Admission {
        let now = Instant::now();
        let mut state = self.lock();

        if !state.open {
            return Admission::Allowed;
        }

        let elapsed = state
            .last_failure
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or(self.reset_timeout);

        if elapsed >= self.reset_timeout {
            state.open = false;
            state.failure_count = 0;
            drop(state);

            tracing::info!(
                cooled_down_secs = elapsed.as_secs_f64(),
                "Circuit breaker closed after cool-down"
            );
            metrics::record_circuit_open(false);
            Admission::Reset
        } else {
            Admission::Rejected {
                retry_after: self.reset_timeout - elapsed,
            }
        }
    }

    /// Count one failed attempt and stamp the failure time. Returns the new count.
    pub fn record_failure(&self) -> u32 {
        let mut state = self.lock();
        state.failure_count = state.failure_count.saturating_add(1);
        state.last_failure = Some(Instant::now());
        state.failure_count
    }

    /// A successful upstream fetch clears the failure count.
    pub fn record_success(&self) {
        self.lock().failure_count = 0;
    }

    /// Open the circuit if the failure count has reached the threshold.
    ///
    /// Called once a retry sequence is exhausted. Returns `true` only on the
    /// closed → open transition.
    pub fn trip_if_exceeded(&self) -> bool {
        let mut state = self.lock();
        if state.open || state.failure_count < self.failure_threshold {
            return false;
        }

        state.open = true;
        let failure_count = state.failure_count;
        drop(state);

        tracing::warn!(
            failure_count,
            threshold = self.failure_threshold,
            reset_timeout_secs = self.reset_timeout.as_secs_f64(),
            "Circuit breaker opened"
        );
        metrics::record_circuit_open(true);
        true
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let now = Instant::now();
        let state = self.lock();
        BreakerSnapshot {
            state: if state.open {
                CircuitState::Open
            } else {
                CircuitState::Closed
            },
            open: state.open,
            failure_count: state.failure_count,
            last_failure_age_secs: state
                .last_failure
                .map(|at| now.saturating_duration_since(at).as_secs_f64()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(5, Duration::from_secs(30))
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_closed() {
        let cb = breaker();
        assert_eq!(cb.admit(), Admission::Allowed);
        assert_eq!(cb.snapshot().state, CircuitState::Closed);
        assert_eq!(cb.snapshot().last_failure_age_secs, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_trip_below_threshold() {
        let cb = breaker();
        for _ in 0..4 {
            cb.record_failure();
        }
        assert!(!cb.trip_if_exceeded());
        assert!(!cb.is_open());
        assert_eq!(cb.admit(), Admission::Allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trips_at_threshold_and_rejects() {
        let cb = breaker();
        for _ in 0..5 {
            cb.record_failure();
        }
        assert!(cb.trip_if_exceeded());
        // Already open: no second transition.
        assert!(!cb.trip_if_exceeded());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(
            cb.admit(),
            Admission::Rejected {
                retry_after: Duration::from_secs(20)
            }
        );
        assert!(cb.is_open());
        assert_eq!(cb.failure_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resets_lazily_after_timeout() {
        let cb = breaker();
        for _ in 0..6 {
            cb.record_failure();
        }
        cb.trip_if_exceeded();

        tokio::time::advance(Duration::from_secs(30)).await;
        // Still open until someone asks.
        assert!(cb.is_open());

        assert_eq!(cb.admit(), Admission::Reset);
        assert!(!cb.is_open());
        assert_eq!(cb.failure_count(), 0);
        assert_eq!(cb.admit(), Admission::Allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cool_down_counts_from_last_failure() {
        let cb = breaker();
        for _ in 0..5 {
            cb.record_failure();
        }
        cb.trip_if_exceeded();

        tokio::time::advance(Duration::from_secs(20)).await;
        cb.record_failure();

        tokio::time::advance(Duration::from_secs(15)).await;
        assert!(!cb.admit().is_allowed());

        tokio::time::advance(Duration::from_secs(15)).await;
        assert_eq!(cb.admit(), Admission::Reset);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_clears_failures() {
        let cb = breaker();
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.snapshot().last_failure_age_secs.is_some());
    }
}
