//! Caching subsystem.
//!
//! # Data Flow
//! ```text
//! fetch(key)
//!     → ttl.rs get (fresh entry? serve it)
//!     → upstream success → ttl.rs set (entry + last-valid shadow)
//!     → upstream down → ttl.rs get_last_valid (stale but known good)
//! ```
//!
//! # Design Decisions
//! - One mutex per cache, one critical section per call
//! - Expiry is lazy: purged by the read that observes it, no sweeper task
//! - The last-valid shadow is never evicted for the life of the process

pub mod ttl;

pub use ttl::{CacheStats, TtlCache};
