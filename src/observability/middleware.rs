//! Request observability middleware.
//!
//! Wraps every route: starts a timer, runs the handler chain, then records the
//! request counter, the latency histogram, and one access log line. Panics are
//! turned into 500 responses by an inner guard so they are still counted.

use std::any::Any;
use std::time::Instant;

use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    middleware::{self, Next},
    response::Response,
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;

use super::logging::ACCESS_LOG_TARGET;
use super::metrics;
use crate::http::request::request_id;

/// Wrap `router` with the panic guard and the metrics/logging stage.
pub fn observe(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(track_requests))
}

/// Record metrics and emit the access log for one request.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = request_id(request.headers()).to_string();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed = start.elapsed();
    metrics::record_request(&method, &path, status, elapsed);

    tracing::info!(
        target: ACCESS_LOG_TARGET,
        event = "request",
        method = %method,
        path = %path,
        status,
        duration_ms = elapsed.as_millis() as u64,
        request_id = %request_id,
        "request completed"
    );

    response
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");

    let mut response = Response::new(Body::from(r#"{"detail":"Internal Server Error"}"#));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    response
}
