//! Health diagnostics assembled from the fetch context.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::fetch::{RetryingFetcher, TelemetrySnapshot};
use crate::resilience::BreakerSnapshot;

/// Overall verdict for the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Upstream reachable as far as we know.
    Ok,
    /// Serving from fallback, or the circuit is open.
    Degraded,
    /// The last fetch had nothing to serve.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub cache: CacheStats,
    pub circuit_breaker: BreakerSnapshot,
    pub last_fetch: Option<TelemetrySnapshot>,
}

impl HealthReport {
    pub fn collect(fetcher: &RetryingFetcher) -> Self {
        let cache = fetcher.cache_stats();
        let circuit_breaker = fetcher.breaker();
        let last_fetch = fetcher.last_fetch();
        let status = classify(&circuit_breaker, last_fetch.as_ref());

        Self {
            status,
            cache,
            circuit_breaker,
            last_fetch,
        }
    }
}

fn classify(breaker: &BreakerSnapshot, last_fetch: Option<&TelemetrySnapshot>) -> HealthStatus {
    match last_fetch {
        Some(t) if t.http_status >= 500 => HealthStatus::Unavailable,
        Some(t) if t.used_fallback => HealthStatus::Degraded,
        _ if breaker.open => HealthStatus::Degraded,
        _ => HealthStatus::Ok,
    }
}
