//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Sync engine (adds, resyncs, removals, episode upserts)
//! - Bulk import (pages walked, item dispositions)
//! - Metadata provider requests

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Sync Engine Metrics
// =============================================================================

/// Sync operations total by operation and outcome.
pub static SYNC_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("hallyu_sync_attempts_total", "Total sync operations"),
        // operation: "add", "resync", "remove"; outcome: "success", "error"
        &["operation", "outcome"],
    )
    .unwrap()
});

/// Sync operation duration in seconds.
pub static SYNC_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "hallyu_sync_duration_seconds",
            "Duration of sync operations",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"],
    )
    .unwrap()
});

/// Episode rows upserted total.
pub static EPISODES_UPSERTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "hallyu_episodes_upserted_total",
        "Total episode rows upserted",
    )
    .unwrap()
});

/// Refresh cycles completed total.
pub static REFRESH_CYCLES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "hallyu_refresh_cycles_total",
        "Total background refresh cycles completed",
    )
    .unwrap()
});

// =============================================================================
// Bulk Import Metrics
// =============================================================================

/// Discover pages walked by bulk runs.
pub static BULK_PAGES_FETCHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "hallyu_bulk_pages_fetched_total",
        "Total discover pages fetched by bulk runs",
    )
    .unwrap()
});

/// Bulk run items by disposition.
pub static BULK_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("hallyu_bulk_items_total", "Bulk run items by disposition"),
        &["disposition"], // "imported", "updated", "skipped", "filtered", "error"
    )
    .unwrap()
});

// =============================================================================
// Provider Metrics
// =============================================================================

/// Metadata provider requests total by endpoint and outcome.
pub static PROVIDER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hallyu_provider_requests_total",
            "Total metadata provider requests",
        ),
        &["endpoint", "outcome"], // outcome: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Sync engine
        Box::new(SYNC_ATTEMPTS.clone()),
        Box::new(SYNC_DURATION.clone()),
        Box::new(EPISODES_UPSERTED.clone()),
        Box::new(REFRESH_CYCLES.clone()),
        // Bulk import
        Box::new(BULK_PAGES_FETCHED.clone()),
        Box::new(BULK_ITEMS.clone()),
        // Provider
        Box::new(PROVIDER_REQUESTS.clone()),
    ]
}
