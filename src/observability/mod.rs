//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request produces:
//!     → middleware.rs (timer, counter, histogram, access log line)
//!     → metrics.rs (Prometheus recorder, rendered at /metrics)
//!     → tracing.rs (one span per request, exported over OTLP)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Distributed tracing (OTLP collector, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows into every access log line
//! - Metrics are cheap (atomic increments)
//! - Tracing is optional; metrics and logs never depend on it

pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod tracing;

use crate::config::TelemetryConfig;

pub use self::tracing::TracingGuard;

/// Errors raised while bootstrapping logging and tracing.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("failed to build trace exporter: {0}")]
    Exporter(String),

    #[error("invalid log filter: {0}")]
    Filter(String),

    #[error("failed to install log subscriber: {0}")]
    Subscriber(String),
}

/// One-time process setup: tracer provider (if enabled), then the subscriber.
///
/// Keep the returned guard alive for the life of the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TracingGuard, TelemetryError> {
    let (tracer, guard) = self::tracing::init_tracer(config)?;
    logging::init_logging(config, tracer)?;
    Ok(guard)
}
