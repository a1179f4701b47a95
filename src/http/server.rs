//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, observability, limits)
//! - Bind server to listener and shut down gracefully
//!
//! Layer order, outermost first:
//! ```text
//! SetRequestId → PropagateRequestId → Trace (if enabled)
//!     → observability middleware → CatchPanic → Timeout → BodyLimit → handler
//! ```

use std::time::Duration;

use axum::{
    routing::{get, patch},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

use crate::config::{AppConfig, ServerConfig};
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::observability::{middleware::observe, tracing::http_trace_layer};
use crate::store::TaskStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: TaskStore,
    pub metrics: PrometheusHandle,
}

/// HTTP server for the task service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &AppConfig, state: AppState) -> Self {
        let router = build_router(state, &config.server, config.telemetry.tracing_enabled);
        Self { router }
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

}

/// Build the router once: routes first, then layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, config: &ServerConfig, instrument: bool) -> Router {
    let routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route("/tasks/{task_id}/done", patch(handlers::mark_done))
        .route("/metrics", get(handlers::render_metrics))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)));

    let mut router = observe(routes);
    if instrument {
        router = router.layer(http_trace_layer());
    }

    router
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
}
