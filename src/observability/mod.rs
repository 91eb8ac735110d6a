//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! fetch context, HTTP middleware
//!     → logging.rs (structured events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Metrics calls are no-ops until a recorder is installed, so tests
//!   and library users pay nothing
//! - Request ID is attached by the HTTP layer and shows up in trace spans

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
