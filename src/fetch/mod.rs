//! Resilient data-acquisition subsystem.
//!
//! # Data Flow
//! ```text
//! route handler
//!     → fetcher.rs fetch(key, bypass_cache)
//!         → cache (fresh?) → resilience (breaker, retries, timeouts) → upstream
//!         → telemetry.rs (last outcome, written on every terminal branch)
//!     ← FetchOutcome { records | None, status, used_fallback }
//! ```
//!
//! # Design Decisions
//! - The fetcher is an explicit context object, not a set of globals
//! - No single-flight: concurrent misses on one key each call upstream
//! - No cancellation: an attempt runs until it completes or times out

pub mod fetcher;
pub mod telemetry;

pub use fetcher::{FetchOutcome, Records, RetryingFetcher};
pub use telemetry::{FetchTelemetry, TelemetrySnapshot};
