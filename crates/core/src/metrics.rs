//! Prometheus metrics for batch runs.
//!
//! This module provides metrics for:
//! - Runs (outcome, duration)
//! - Rows (locked, completed, failed, contended)
//! - Publishing (per backend)
//! - Pings (per result)
//!
//! A run is a short-lived process, so nothing scrapes it; the binary writes
//! [`encode_metrics`] to a node-exporter textfile instead.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// Runs
// =============================================================================

/// Runs total by outcome.
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("linkdigest_runs_total", "Total batch runs"),
        &["outcome"], // "no_work", "completed", "aborted", "error"
    )
    .unwrap()
});

/// Run duration in seconds.
pub static RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("linkdigest_run_duration_seconds", "Duration of a batch run")
            .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Rows
// =============================================================================

/// Rows moved to Processing.
pub static ROWS_LOCKED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("linkdigest_rows_locked_total", "Rows locked for processing").unwrap()
});

/// Rows skipped because another writer locked them first.
pub static ROWS_CONTENDED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "linkdigest_rows_contended_total",
        "Rows that were no longer empty when locking",
    )
    .unwrap()
});

/// Rows resolved to Completed.
pub static ROWS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("linkdigest_rows_completed_total", "Rows marked Completed").unwrap()
});

/// Rows resolved to an error status, by label.
pub static ROWS_FAILED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("linkdigest_rows_failed_total", "Rows marked with an error status"),
        &["label"],
    )
    .unwrap()
});

// =============================================================================
// Publishing and pings
// =============================================================================

/// Publish attempts by backend and result.
pub static PUBLISH_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("linkdigest_publish_attempts_total", "Publish attempts"),
        &["backend", "result"], // result: "success", "failure"
    )
    .unwrap()
});

/// Pings by result.
pub static PINGS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("linkdigest_pings_total", "Crawler pings sent"),
        &["result"], // "delivered", "failed"
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    registry.register(Box::new(RUNS_TOTAL.clone())).unwrap();
    registry.register(Box::new(RUN_DURATION.clone())).unwrap();
    registry.register(Box::new(ROWS_LOCKED.clone())).unwrap();
    registry.register(Box::new(ROWS_CONTENDED.clone())).unwrap();
    registry.register(Box::new(ROWS_COMPLETED.clone())).unwrap();
    registry.register(Box::new(ROWS_FAILED.clone())).unwrap();
    registry
        .register(Box::new(PUBLISH_ATTEMPTS.clone()))
        .unwrap();
    registry.register(Box::new(PINGS_TOTAL.clone())).unwrap();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        RUNS_TOTAL.with_label_values(&["no_work"]).inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("linkdigest_runs_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_row_metrics() {
        ROWS_LOCKED.inc_by(0);
        ROWS_COMPLETED.inc_by(0);
        ROWS_FAILED.with_label_values(&["Gist"]).inc_by(0);
        PINGS_TOTAL.with_label_values(&["delivered"]).inc_by(0);

        let output = encode_metrics().unwrap();
        assert!(output.contains("linkdigest_rows_locked_total"));
        assert!(output.contains("linkdigest_rows_completed_total"));
        assert!(output.contains("linkdigest_rows_failed_total"));
        assert!(output.contains("linkdigest_pings_total"));
    }
}
