//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::sync::Once;
use std::time::Instant;

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("agora_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "agora_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Database Metrics
    pub static ref DB_QUERIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("agora_db_queries_total", "Total number of database queries"),
        &["operation", "table"]
    ).expect("metric can be created");
    pub static ref DB_QUERY_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "agora_db_query_duration_seconds",
            "Database query duration in seconds"
        ).buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        &["operation", "table"]
    ).expect("metric can be created");

    // Feed Metrics
    pub static ref FEED_PAGES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("agora_feed_pages_total", "Total number of feed pages assembled"),
        &["mode", "outcome"]
    ).expect("metric can be created");
    pub static ref FEED_ASSEMBLY_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "agora_feed_assembly_duration_seconds",
            "Feed page assembly duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["mode"]
    ).expect("metric can be created");
    pub static ref FEED_DEGRADED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "agora_feed_degraded_total",
            "Missing references absorbed while assembling feeds"
        ),
        &["reason"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("agora_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; registration happens on the first call.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
            .expect("HTTP_REQUESTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
            .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(DB_QUERIES_TOTAL.clone()))
            .expect("DB_QUERIES_TOTAL can be registered");
        REGISTRY
            .register(Box::new(DB_QUERY_DURATION_SECONDS.clone()))
            .expect("DB_QUERY_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(FEED_PAGES_TOTAL.clone()))
            .expect("FEED_PAGES_TOTAL can be registered");
        REGISTRY
            .register(Box::new(FEED_ASSEMBLY_DURATION_SECONDS.clone()))
            .expect("FEED_ASSEMBLY_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(FEED_DEGRADED_TOTAL.clone()))
            .expect("FEED_DEGRADED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}

/// Record one database query of `operation` on `table`.
pub fn observe_db_query(operation: &str, table: &str, started: Instant) {
    DB_QUERIES_TOTAL
        .with_label_values(&[operation, table])
        .inc();
    DB_QUERY_DURATION_SECONDS
        .with_label_values(&[operation, table])
        .observe(started.elapsed().as_secs_f64());
}

/// Record a missing reference that was absorbed instead of failing the page.
pub fn record_degraded(reason: &str) {
    FEED_DEGRADED_TOTAL.with_label_values(&[reason]).inc();
}
