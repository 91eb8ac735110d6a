//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by method, route, status
//! - `gateway_request_duration_seconds` (histogram): inbound latency
//! - `gateway_cache_lookups_total` (counter): primary cache hits and misses
//! - `gateway_upstream_attempts_total` (counter): upstream attempts by result
//! - `gateway_fetch_total` (counter): terminal fetch branches by outcome
//! - `gateway_circuit_open` (gauge): 1=open, 0=closed
//!
//! Without an installed recorder every call here is a no-op, so the fetch
//! layer records unconditionally.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("gateway_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_upstream_attempt(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("gateway_upstream_attempts_total", "result" => result).increment(1);
}

pub fn record_fetch_outcome(outcome: &'static str) {
    counter!("gateway_fetch_total", "outcome" => outcome).increment(1);
}

pub fn record_circuit_open(open: bool) {
    gauge!("gateway_circuit_open").set(if open { 1.0 } else { 0.0 });
}
