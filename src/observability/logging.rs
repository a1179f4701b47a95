//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Bridge spans to OpenTelemetry when a tracer is supplied
//!
//! # Design Decisions
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides the configured level

use opentelemetry_sdk::trace::Tracer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::TelemetryError;
use crate::config::{LogFormat, TelemetryConfig};

/// Target used for the per-request access log line.
pub const ACCESS_LOG_TARGET: &str = "task_service::access";

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(config: &TelemetryConfig, tracer: Option<Tracer>) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| TelemetryError::Filter(e.to_string()))?,
    };

    let otel = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let (json, pretty) = match config.log_format {
        LogFormat::Json => (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false),
            ),
            None,
        ),
        LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer().pretty())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(otel)
        .with(json)
        .with(pretty)
        .try_init()
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))
}
