//! Per-attempt deadline enforcement.
//!
//! Every upstream attempt runs under its own deadline; an attempt that
//! overruns is dropped and reported as `UpstreamError::Timeout`.

use std::future::Future;
use std::time::Duration;

use crate::upstream::UpstreamError;

/// Run `attempt`, failing with [`UpstreamError::Timeout`] after `limit`.
pub async fn with_timeout<T, F>(limit: Duration, attempt: F) -> Result<T, UpstreamError>
where
    F: Future<Output = Result<T, UpstreamError>>,
{
    match tokio::time::timeout(limit, attempt).await {
        Ok(result) => result,
        Err(_) => Err(UpstreamError::Timeout(limit)),
    }
}
