//! Upstream payload and error definitions.

use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// One upstream record. Shape validation happens downstream.
pub type Record = Value;

/// Body shape returned by the upstream source.
#[derive(Debug, Deserialize)]
pub struct ProductsEnvelope {
    pub products: Vec<Record>,
}

/// A successful upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamPayload {
    /// HTTP status the upstream answered with (always 2xx).
    pub status: u16,
    pub records: Vec<Record>,
}

/// Reasons a single upstream attempt failed.
///
/// The fetcher treats them all the same: one failed attempt.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The attempt did not finish within its deadline.
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, TLS or protocol failure.
    #[error("upstream transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-2xx status.
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// A 2xx body that is not `{"products": [...]}`.
    #[error("upstream body could not be decoded: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Status code to report for this failure, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status(code) => Some(*code),
            _ => None,
        }
    }
}
