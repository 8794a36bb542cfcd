//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Ingestion (uploads accepted/rejected)
//! - Processing jobs (lifecycle counters, stage durations)
//! - Orders (creation, transitions)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Ingestion Metrics
// =============================================================================

/// Upload attempts total by result.
pub static UPLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fotopainter_uploads_total", "Total upload attempts"),
        &["result"], // "accepted", "rejected"
    )
    .unwrap()
});

/// Accepted upload sizes in bytes.
pub static UPLOAD_SIZE_BYTES: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("fotopainter_upload_size_bytes", "Size of accepted uploads").buckets(
            vec![
                16_384.0,
                65_536.0,
                262_144.0,
                1_048_576.0,
                4_194_304.0,
                10_485_760.0,
            ],
        ),
    )
    .unwrap()
});

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs started total.
pub static JOBS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("fotopainter_jobs_started_total", "Total jobs started").unwrap()
});

/// Jobs completed total.
pub static JOBS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fotopainter_jobs_completed_total",
        "Total jobs completed successfully",
    )
    .unwrap()
});

/// Jobs failed total.
pub static JOBS_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("fotopainter_jobs_failed_total", "Total jobs that failed").unwrap()
});

/// Jobs cancelled total.
pub static JOBS_CANCELLED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("fotopainter_jobs_cancelled_total", "Total jobs cancelled").unwrap()
});

/// Job retry attempts total.
pub static JOB_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("fotopainter_job_retries_total", "Total job retry attempts").unwrap()
});

/// Job rejections at capacity.
pub static JOBS_REJECTED_AT_CAPACITY: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fotopainter_jobs_rejected_at_capacity_total",
        "Total job starts rejected because the worker pool was full",
    )
    .unwrap()
});

/// Pipeline stage duration in seconds.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fotopainter_stage_duration_seconds",
            "Duration of pipeline stages",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["stage"], // "decode", "quantize", "template", "rank"
    )
    .unwrap()
});

/// Palettes produced per completed artwork.
pub static PALETTES_PER_ARTWORK: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "fotopainter_palettes_per_artwork",
            "Number of palettes produced per completed artwork",
        )
        .buckets(vec![1.0, 2.0, 3.0, 4.0, 5.0]),
    )
    .unwrap()
});

// =============================================================================
// Order Metrics
// =============================================================================

/// Orders created total by product type.
pub static ORDERS_CREATED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fotopainter_orders_created_total", "Total orders created"),
        &["product_type"], // "digital", "physical"
    )
    .unwrap()
});

/// Order status transitions total by result.
pub static ORDER_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "fotopainter_order_transitions_total",
            "Total order status transition attempts",
        ),
        &["result"], // "applied", "rejected"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Ingestion
        Box::new(UPLOADS_TOTAL.clone()),
        Box::new(UPLOAD_SIZE_BYTES.clone()),
        // Jobs
        Box::new(JOBS_STARTED.clone()),
        Box::new(JOBS_COMPLETED.clone()),
        Box::new(JOBS_FAILED.clone()),
        Box::new(JOBS_CANCELLED.clone()),
        Box::new(JOB_RETRIES.clone()),
        Box::new(JOBS_REJECTED_AT_CAPACITY.clone()),
        Box::new(STAGE_DURATION.clone()),
        Box::new(PALETTES_PER_ARTWORK.clone()),
        // Orders
        Box::new(ORDERS_CREATED.clone()),
        Box::new(ORDER_TRANSITIONS.clone()),
    ]
}
