//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the OTLP exporter and tracer provider once at startup
//! - Extract W3C trace context from incoming requests
//! - Create one span per HTTP request
//!
//! # Design Decisions
//! - Gated by `telemetry.tracing_enabled`; when off nothing is installed
//! - Spans are exported in batches on the Tokio runtime
//! - `tracing` spans are bridged to OpenTelemetry, so handlers only ever use
//!   the `tracing` API

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, Response};
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::TelemetryError;
use crate::config::TelemetryConfig;

/// Keeps the tracer provider alive; flushes pending spans on drop.
#[derive(Default)]
pub struct TracingGuard {
    provider: Option<TracerProvider>,
}

impl TracingGuard {
    /// Whether an exporter was installed.
    pub fn is_active(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Failed to flush trace exporter");
            }
        }
    }
}

/// Install the global tracer provider when tracing is enabled.
///
/// Must be called from within a Tokio runtime. Returns the tracer to bridge
/// into the subscriber along with the guard owning the provider.
pub fn init_tracer(config: &TelemetryConfig) -> Result<(Option<Tracer>, TracingGuard), TelemetryError> {
    if !config.tracing_enabled {
        return Ok((None, TracingGuard::default()));
    }

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(config.exporter_endpoint.clone())
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new([KeyValue::new(
            "service.name",
            config.service_name.clone(),
        )]))
        .build();

    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());
    opentelemetry::global::set_tracer_provider(provider.clone());

    let tracer = provider.tracer(env!("CARGO_PKG_NAME"));
    Ok((
        Some(tracer),
        TracingGuard {
            provider: Some(provider),
        },
    ))
}

/// Layer emitting one `http_request` span per request.
pub fn http_trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    fn(&Request<Body>) -> Span,
    (),
    fn(&Response<Body>, Duration, &Span),
> {
    TraceLayer::new_for_http()
        .make_span_with(make_request_span as fn(&Request<Body>) -> Span)
        .on_request(())
        .on_response(record_response as fn(&Response<Body>, Duration, &Span))
}

fn make_request_span(request: &Request<Body>) -> Span {
    let method = request.method();
    let path = request.uri().path();
    let span = tracing::info_span!(
        "http_request",
        otel.name = %format!("{method} {path}"),
        otel.kind = "server",
        http.request.method = %method,
        url.path = %path,
        http.response.status_code = tracing::field::Empty,
    );
    set_parent_from_headers(&span, request.headers());
    span
}

fn record_response(response: &Response<Body>, latency: Duration, span: &Span) {
    span.record("http.response.status_code", response.status().as_u16());
    tracing::debug!(latency_ms = latency.as_millis() as u64, "response sent");
}

/// Continue an upstream trace if the request carries `traceparent`.
pub fn set_parent_from_headers(span: &Span, headers: &HeaderMap) {
    let parent = opentelemetry::global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(headers))
    });
    span.set_parent(parent);
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|key| key.as_str()).collect()
    }
}
