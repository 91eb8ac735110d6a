//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, per-route metrics)
//!     → handlers.rs (status, health, products, summary)
//!         → fetch context → catalog validation
//!     → response.rs (JSON envelopes, ApiError → 400/503)
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{build_router, AppState, GatewayServer};
