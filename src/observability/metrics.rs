//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, path, status
//! - `http_request_duration_seconds` (histogram): latency by method, path
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; the Prometheus recorder
//!   accumulates atomically and is installed once per process
//! - Histogram buckets tuned for typical web latencies

use std::sync::OnceLock;
use std::time::Duration;

use metrics::Unit;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

/// Content type of the Prometheus text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

static RECORDER: OnceLock<Result<PrometheusHandle, String>> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
#[error("failed to install metrics recorder: {0}")]
pub struct MetricsError(String);

/// Install the process-wide Prometheus recorder.
///
/// Safe to call more than once; later calls return a handle to the recorder
/// installed by the first.
pub fn init_metrics() -> Result<PrometheusHandle, MetricsError> {
    RECORDER
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .set_buckets_for_metric(
                    Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
                    LATENCY_BUCKETS,
                )
                .map_err(|e| e.to_string())?
                .install_recorder()
                .map_err(|e| e.to_string())?;

            metrics::describe_counter!(REQUESTS_TOTAL, "Total HTTP requests");
            metrics::describe_histogram!(
                REQUEST_DURATION_SECONDS,
                Unit::Seconds,
                "HTTP request duration (s)"
            );
            Ok(handle)
        })
        .clone()
        .map_err(MetricsError)
}

/// Record one completed request.
pub fn record_request(method: &str, path: &str, status: u16, duration: Duration) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(
        REQUEST_DURATION_SECONDS,
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration.as_secs_f64());
}
