//! Catalog gateway library.
//!
//! A resilient read path in front of one upstream catalog API: a TTL cache
//! with a last-valid shadow store, a circuit breaker, and a retrying fetcher,
//! exposed over a small JSON HTTP surface.

// Core fetch path
pub mod cache;
pub mod fetch;
pub mod resilience;
pub mod upstream;

// Data shaping and serving
pub mod catalog;
pub mod health;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use fetch::{FetchOutcome, RetryingFetcher};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
