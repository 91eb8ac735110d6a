//! Last-fetch telemetry for health diagnostics.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of the most recent fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub timestamp: DateTime<Utc>,
    pub http_status: u16,
    pub used_fallback: bool,
}

/// Write-then-forget record of the last fetch outcome.
///
/// The fetcher writes it on every terminal branch and never reads it back.
/// Each write replaces the whole snapshot atomically, so readers never see a
/// status from one fetch paired with the fallback flag of another.
#[derive(Default)]
pub struct FetchTelemetry {
    last: ArcSwapOption<TelemetrySnapshot>,
}

impl FetchTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, http_status: u16, used_fallback: bool) {
        self.last.store(Some(Arc::new(TelemetrySnapshot {
            timestamp: Utc::now(),
            http_status,
            used_fallback,
        })));
    }

    /// `None` until the first fetch completes.
    pub fn snapshot(&self) -> Option<TelemetrySnapshot> {
        self.last.load_full().map(|s| (*s).clone())
    }
}
