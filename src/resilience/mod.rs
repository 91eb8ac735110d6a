//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Fetch from upstream:
//!     → circuit_breaker.rs (admit? open circuits short-circuit to fallback)
//!     → timeouts.rs (each attempt has its own deadline)
//!     → On failure: retries.rs (count the failure, back off, try again)
//!     → backoff.rs (base * factor^attempt, optional jitter)
//!     → Exhausted: circuit_breaker.rs trips if the threshold is reached
//! ```
//!
//! # Design Decisions
//! - Timeouts, transport errors and non-2xx statuses are one failure kind
//! - The breaker is pull-based; no background timer exists
//! - Nothing here panics or propagates to the caller; exhaustion degrades to fallback

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{Admission, BreakerSnapshot, CircuitBreaker, CircuitState};
pub use retries::{retry, RetryExhausted, RetryPolicy};
pub use timeouts::with_timeout;
