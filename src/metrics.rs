//! Prometheus metrics for request monitoring.
//!
//! This module provides:
//! - Handler latency per endpoint
//! - Request counts per endpoint and status
//! - Users created and store failures

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// Users created counter metric name.
pub const METRIC_USERS_CREATED: &str = "users_created_total";
/// Store errors counter metric name.
pub const METRIC_STORE_ERRORS: &str = "store_errors_total";

/// Install the global Prometheus recorder and register metric descriptions.
///
/// Call this once at startup; the returned handle renders the exposition text.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP handler latency in milliseconds"
    );
    describe_counter!(
        METRIC_HTTP_REQUESTS,
        "Total number of HTTP requests by endpoint and status"
    );
    describe_counter!(METRIC_USERS_CREATED, "Total number of users created");
    describe_counter!(
        METRIC_STORE_ERRORS,
        "Total number of failed store operations"
    );

    debug!("Metrics initialized");
    Ok(handle)
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Increment HTTP requests counter.
pub fn inc_http_requests(endpoint: &str, status: u16) {
    counter!(
        METRIC_HTTP_REQUESTS,
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Increment users created counter.
pub fn inc_users_created() {
    counter!(METRIC_USERS_CREATED).increment(1);
}

/// Increment store errors counter.
pub fn inc_store_errors() {
    counter!(METRIC_STORE_ERRORS).increment(1);
}

/// RAII guard for timing a handler.
/// Records latency for its endpoint when dropped.
pub struct LatencyTimer {
    start: Instant,
    endpoint: String,
}

impl LatencyTimer {
    /// Create a new latency timer for the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.into(),
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_http_latency(self.start, &self.endpoint);
    }
}

/// Create a latency timer for an HTTP endpoint.
pub fn timer_http(endpoint: impl Into<String>) -> LatencyTimer {
    LatencyTimer::new(endpoint)
}
