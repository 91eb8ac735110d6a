//! Cache-first, breaker-guarded, retrying fetch of upstream records.
//!
//! ```text
//! fetch(key, bypass_cache)
//!     1. cache hit (unless bypassed)          → (records, 200, false)
//!     2. breaker open and cooling down        → last valid: (records, 200, true)
//!                                               or nothing: (None, 503, true)
//!     3. up to max_attempts upstream attempts with backoff
//!          success → reset failures, refresh cache → (records, 200, false)
//!     4. exhausted → maybe open breaker → same fallback as step 2
//! ```
//!
//! Telemetry is written as the last step of every branch.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheStats, TtlCache};
use crate::config::GatewayConfig;
use crate::fetch::telemetry::{FetchTelemetry, TelemetrySnapshot};
use crate::observability::metrics;
use crate::resilience::{retry, with_timeout, Admission, BreakerSnapshot, CircuitBreaker, RetryPolicy};
use crate::upstream::{Record, UpstreamError, UpstreamSource};

/// Shared, immutable record list. Cache hits hand out the same allocation.
pub type Records = Arc<Vec<Record>>;

/// What a caller gets back from [`RetryingFetcher::fetch`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    /// `None` only when upstream is unavailable and nothing was ever cached.
    pub records: Option<Records>,
    pub status: u16,
    pub used_fallback: bool,
}

impl FetchOutcome {
    fn fresh(records: Records) -> Self {
        Self {
            records: Some(records),
            status: 200,
            used_fallback: false,
        }
    }

    fn fallback(records: Option<Records>) -> Self {
        let status = if records.is_some() { 200 } else { 503 };
        Self {
            records,
            status,
            used_fallback: true,
        }
    }

    pub fn is_available(&self) -> bool {
        self.records.is_some()
    }
}

/// The resilient data-acquisition context.
///
/// Owns the cache, the circuit breaker and the telemetry for one upstream.
/// The server keeps one of these behind an `Arc` and hands it to handlers.
pub struct RetryingFetcher {
    upstream: Arc<dyn UpstreamSource>,
    cache: TtlCache<String, Records>,
    breaker: CircuitBreaker,
    telemetry: FetchTelemetry,
    retry_policy: RetryPolicy,
    attempt_timeout: Duration,
    default_ttl: Duration,
}

impl RetryingFetcher {
    pub fn new(upstream: Arc<dyn UpstreamSource>, config: &GatewayConfig) -> Self {
        Self {
            upstream,
            cache: TtlCache::new(),
            breaker: CircuitBreaker::from_config(&config.circuit_breaker),
            telemetry: FetchTelemetry::new(),
            retry_policy: RetryPolicy::from_config(&config.retries),
            attempt_timeout: config.upstream.timeout(),
            default_ttl: config.cache.default_ttl(),
        }
    }

    /// Fetch records for `key`, shielding the caller from upstream failure.
    ///
    /// Never fails: the worst outcome is `(None, 503, true)`.
    pub async fn fetch(&self, key: &str, bypass_cache: bool) -> FetchOutcome {
        if !bypass_cache {
            if let Some(records) = self.cache.get(key) {
                metrics::record_cache_lookup(true);
                tracing::debug!(key, records = records.len(), "Serving from cache");
                return self.finish("cache_hit", 200, FetchOutcome::fresh(records));
            }
            metrics::record_cache_lookup(false);
        }

        match self.breaker.admit() {
            Admission::Rejected { retry_after } => {
                tracing::warn!(
                    key,
                    retry_after_secs = retry_after.as_secs_f64(),
                    "Circuit open, skipping upstream"
                );
                return self.fall_back(key);
            }
            Admission::Reset => {
                tracing::info!(key, "Circuit reset, retrying upstream");
            }
            Admission::Allowed => {}
        }

        let upstream = self.upstream.as_ref();
        let timeout = self.attempt_timeout;
        let breaker = &self.breaker;

        let result = retry(
            "upstream_fetch",
            &self.retry_policy,
            |attempt, err: &UpstreamError| {
                let failure_count = breaker.record_failure();
                metrics::record_upstream_attempt(false);
                tracing::debug!(
                    key,
                    attempt = attempt + 1,
                    failure_count,
                    status = ?err.status(),
                    "Upstream attempt failed"
                );
            },
            move |_| with_timeout(timeout, upstream.fetch_records(key)),
        )
        .await;

        match result {
            Ok(payload) => {
                self.breaker.record_success();
                metrics::record_upstream_attempt(true);

                let records: Records = Arc::new(payload.records);
                if !bypass_cache {
                    self.cache
                        .set(key.to_string(), records.clone(), self.default_ttl);
                }

                tracing::info!(
                    key,
                    records = records.len(),
                    upstream_status = payload.status,
                    bypass_cache,
                    "Fetched from upstream"
                );
                self.finish("upstream", payload.status, FetchOutcome::fresh(records))
            }
            Err(exhausted) => {
                let opened = self.breaker.trip_if_exceeded();
                tracing::warn!(
                    key,
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    circuit_opened = opened,
                    "Upstream retries exhausted"
                );
                self.fall_back(key)
            }
        }
    }

    /// [`fetch`](Self::fetch) on its own task.
    ///
    /// Dropping the returned future does not cancel the retry sequence: it
    /// still reaches a terminal branch, updating breaker and telemetry.
    pub async fn fetch_detached(self: &Arc<Self>, key: &str, bypass_cache: bool) -> FetchOutcome {
        let fetcher = Arc::clone(self);
        let owned_key = key.to_string();
        let task = tokio::spawn(async move { fetcher.fetch(&owned_key, bypass_cache).await });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(key, error = %e, "Fetch task failed");
                FetchOutcome::fallback(None)
            }
        }
    }

    fn fall_back(&self, key: &str) -> FetchOutcome {
        match self.cache.get_last_valid(key) {
            Some(records) => {
                tracing::info!(key, records = records.len(), "Serving last valid records");
                let outcome = FetchOutcome::fallback(Some(records));
                self.finish("fallback", outcome.status, outcome)
            }
            None => {
                tracing::error!(key, "Upstream unavailable and no fallback stored");
                let outcome = FetchOutcome::fallback(None);
                self.finish("unavailable", outcome.status, outcome)
            }
        }
    }

    fn finish(&self, label: &'static str, telemetry_status: u16, outcome: FetchOutcome) -> FetchOutcome {
        self.telemetry.record(telemetry_status, outcome.used_fallback);
        metrics::record_fetch_outcome(label);
        outcome
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn breaker(&self) -> BreakerSnapshot {
        self.breaker.snapshot()
    }

    pub fn last_fetch(&self) -> Option<TelemetrySnapshot> {
        self.telemetry.snapshot()
    }

    /// Where the records come from, for integrity reports.
    pub fn source(&self) -> String {
        self.upstream.describe()
    }
}
