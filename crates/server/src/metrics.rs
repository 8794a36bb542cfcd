//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the Fotopainter server:
//! - HTTP request metrics (latency, counts, in-flight)
//! - Artwork counts by status (collected dynamically)
//! - Worker pool status (collected dynamically)
//!
//! Pipeline and order metrics live in the core crate and are registered here.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fotopainter_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fotopainter_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "fotopainter_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Artworks by current status (collected dynamically).
pub static ARTWORKS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "fotopainter_artworks_by_status",
            "Current artwork count by status",
        ),
        &["status"],
    )
    .unwrap()
});

/// Jobs currently running in the worker pool (collected dynamically).
pub static POOL_JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "fotopainter_pool_jobs_active",
        "Number of jobs currently held by the worker pool",
    )
    .unwrap()
});

/// Jobs the worker pool has finished since startup (collected dynamically).
pub static POOL_JOBS_PROCESSED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "fotopainter_pool_jobs_processed",
        "Jobs driven to a terminal state since startup",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(ARTWORKS_BY_STATUS.clone()))
        .unwrap();
    registry
        .register(Box::new(POOL_JOBS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(POOL_JOBS_PROCESSED.clone()))
        .unwrap();

    // Core metrics (uploads, pipeline stages, orders)
    for metric in fotopainter_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the worker pool and the
/// artwork store at scrape time.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let stats = state.orchestrator().stats();
    POOL_JOBS_ACTIVE.set(stats.active() as i64);
    POOL_JOBS_PROCESSED.set(stats.total_processed() as i64);

    let artworks = state.artwork_store();
    for status in ["pending", "processing", "completed", "failed"] {
        let filter = fotopainter_core::ArtworkFilter::new().with_status(status);
        if let Ok(count) = artworks.count(&filter) {
            ARTWORKS_BY_STATUS.with_label_values(&[status]).set(count);
        }
    }
}
