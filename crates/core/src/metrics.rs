//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Pipeline (descriptor outcomes, routed files)
//! - Resolution service calls
//! - Downloads (transfers, bytes)
//! - Remote feed

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Descriptors processed by final outcome.
pub static DESCRIPTORS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tinfetch_descriptors_processed_total",
            "Total descriptors processed",
        ),
        &["outcome"], // "archived", "skipped", "abandoned"
    )
    .unwrap()
});

/// Downloaded files by disposition.
pub static FILES_ROUTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tinfetch_files_routed_total", "Total downloaded files routed"),
        &["disposition"], // "library", "discarded"
    )
    .unwrap()
});

/// Time from discovery to the final state of a descriptor.
pub static DESCRIPTOR_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tinfetch_descriptor_duration_seconds",
            "Duration of descriptor processing",
        )
        .buckets(vec![0.1, 1.0, 10.0, 30.0, 60.0, 300.0, 600.0, 1800.0, 3600.0]),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Resolution Service Metrics
// =============================================================================

/// Remote calls by operation and result.
pub static DEBRID_CALLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tinfetch_debrid_calls_total",
            "Total resolution service calls",
        ),
        &["operation", "result"], // operation: "submit", "status", "unlock"
    )
    .unwrap()
});

// =============================================================================
// Download Metrics
// =============================================================================

/// Downloads completed total.
pub static DOWNLOADS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tinfetch_downloads_completed_total",
        "Total downloads completed successfully",
    )
    .unwrap()
});

/// Downloads failed total.
pub static DOWNLOADS_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tinfetch_downloads_failed_total",
        "Total downloads that failed",
    )
    .unwrap()
});

/// Bytes written to the staging folder.
pub static BYTES_DOWNLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tinfetch_bytes_downloaded_total",
        "Total bytes downloaded",
    )
    .unwrap()
});

// =============================================================================
// Feed Metrics
// =============================================================================

/// Descriptors fetched from the remote feed.
pub static FEED_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tinfetch_feed_fetches_total", "Total remote feed fetches"),
        &["result"], // "fetched", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Pipeline
        Box::new(DESCRIPTORS_PROCESSED.clone()),
        Box::new(FILES_ROUTED.clone()),
        Box::new(DESCRIPTOR_DURATION.clone()),
        // Resolution service
        Box::new(DEBRID_CALLS.clone()),
        // Downloads
        Box::new(DOWNLOADS_COMPLETED.clone()),
        Box::new(DOWNLOADS_FAILED.clone()),
        Box::new(BYTES_DOWNLOADED.clone()),
        // Feed
        Box::new(FEED_FETCHES.clone()),
    ]
}
