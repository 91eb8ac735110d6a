//! Upstream source subsystem.
//!
//! # Data Flow
//! ```text
//! fetcher attempt
//!     → client.rs (one GET, no retries)
//!     → types.rs (decode {"products": [...]}, classify failure)
//!     → faults.rs (optional: damage records when inject_faults is set)
//!     → back to the fetcher as payload or UpstreamError
//! ```
//!
//! # Design Decisions
//! - One upstream per gateway; the trait exists so tests can script failures
//! - Records stay opaque JSON here; the catalog layer validates their shape

pub mod client;
pub mod faults;
pub mod types;

pub use client::{HttpUpstream, UpstreamSource};
pub use faults::FaultInjectingUpstream;
pub use types::{ProductsEnvelope, Record, UpstreamError, UpstreamPayload};
