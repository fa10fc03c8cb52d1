//! Prometheus metrics for the pipeline core.
//!
//! This module provides metrics for:
//! - Worker pool (completions, failures, active and queued jobs)
//! - State caches (applied writes, persists, flush latency)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Worker Pool Metrics
// =============================================================================

/// Successfully completed jobs total.
pub static JOBS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediarc_jobs_completed_total",
        "Total jobs completed successfully",
    )
    .unwrap()
});

/// Failed or panicked jobs total.
pub static JOBS_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediarc_jobs_failed_total",
        "Total jobs that failed or panicked",
    )
    .unwrap()
});

/// Jobs currently running.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("mediarc_jobs_active", "Jobs currently running").unwrap()
});

/// Jobs waiting for a free slot.
pub static JOBS_QUEUED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("mediarc_jobs_queued", "Jobs waiting for a free slot").unwrap()
});

// =============================================================================
// State Cache Metrics
// =============================================================================

/// Queued writes applied to the in-memory document.
pub static CACHE_WRITES_APPLIED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediarc_cache_writes_applied_total",
        "Queued cache writes applied to the in-memory document",
    )
    .unwrap()
});

/// Cache document persists by result.
pub static CACHE_PERSISTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediarc_cache_persists_total", "Cache document persists"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Flush duration in seconds.
pub static CACHE_FLUSH_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "mediarc_cache_flush_duration_seconds",
            "Time to settle and persist one flush",
        )
        .buckets(vec![0.005, 0.025, 0.1, 0.25, 0.5, 1.0, 2.5]),
    )
    .unwrap()
});

/// All metrics for registration with a Prometheus registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_COMPLETED.clone()),
        Box::new(JOBS_FAILED.clone()),
        Box::new(JOBS_ACTIVE.clone()),
        Box::new(JOBS_QUEUED.clone()),
        Box::new(CACHE_WRITES_APPLIED.clone()),
        Box::new(CACHE_PERSISTS.clone()),
        Box::new(CACHE_FLUSH_DURATION.clone()),
    ]
}
