//! Health diagnostics subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → report.rs collects, without side effects:
//!         cache stats (live keys, hits, misses)
//!         breaker snapshot (state, failure count)
//!         last fetch telemetry (timestamp, status, fallback flag)
//!     → status verdict: ok / degraded / unavailable
//! ```
//!
//! # Design Decisions
//! - Reading health never evaluates the breaker's cool-down; only fetches do
//! - No active probing of the upstream

pub mod report;

pub use report::{HealthReport, HealthStatus};
