//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! SIGTERM / SIGINT (signals.rs)
//!     → Shutdown::trigger (shutdown.rs)
//!     → server stops accepting, drains in-flight requests, exits
//! ```
//!
//! # Design Decisions
//! - A second signal is not special-cased; the process manager escalates
//! - No reload signal: config changes require a restart

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
