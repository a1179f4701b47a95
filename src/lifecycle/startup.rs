//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the metrics recorder
//! - Ensure the task schema exists
//! - Bind the listener and serve until a shutdown signal arrives
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)

use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics::{init_metrics, MetricsError};
use crate::store::{StoreError, TaskStore};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error("failed to initialize storage: {0}")]
    Store(#[from] StoreError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Initialize everything the server needs and bind its listener.
pub async fn prepare(config: AppConfig) -> Result<(HttpServer, TcpListener), StartupError> {
    let metrics = init_metrics()?;

    let store = TaskStore::new(&config.storage.db_path);
    store.ensure_schema()?;

    let address = config.server.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let local_addr = listener.local_addr().map_err(StartupError::Serve)?;
    tracing::info!(
        address = %local_addr,
        db_path = %store.db_path().display(),
        tracing_enabled = config.telemetry.tracing_enabled,
        "Listening for connections"
    );

    let server = HttpServer::new(&config, AppState { store, metrics });
    Ok((server, listener))
}

/// Serve until SIGINT/SIGTERM, then drain in-flight requests.
pub async fn run(config: AppConfig) -> Result<(), StartupError> {
    let (server, listener) = prepare(config).await?;

    let shutdown = Shutdown::new();
    let mut serving = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut serving => {
            return result?.map_err(StartupError::Serve);
        }
        _ = signals::shutdown_signal() => {}
    }

    shutdown.trigger();
    serving.await?.map_err(StartupError::Serve)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prepare_fails_on_unwritable_storage() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();

        let mut config = AppConfig::default();
        config.server.bind_address = "127.0.0.1:0".to_string();
        config.storage.db_path = blocker.join("app.db").display().to_string();

        let err = prepare(config).await.err().expect("startup must fail");
        assert!(matches!(err, StartupError::Store(StoreError::CreateDir { .. })));
    }

    #[tokio::test]
    async fn prepare_binds_requested_address() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.server.bind_address = "127.0.0.1:0".to_string();
        config.storage.db_path = dir.path().join("app.db").display().to_string();

        let (_server, listener) = prepare(config).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
        assert!(dir.path().join("app.db").exists());
    }
}
