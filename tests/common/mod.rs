//! Shared utilities for end-to-end tests.

use std::net::SocketAddr;

use tempfile::TempDir;
use task_service::config::AppConfig;
use task_service::lifecycle::{startup, Shutdown};

/// A running service bound to an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    _dir: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

/// Start the service against a fresh database with OTLP export disabled.
pub async fn start_server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();

    let mut config = AppConfig::default();
    config.server.bind_address = "127.0.0.1:0".to_string();
    config.storage.db_path = dir.path().join("data").join("app.db").display().to_string();
    config.telemetry.tracing_enabled = false;

    let (server, listener) = startup::prepare(config).await.expect("service starts");
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        shutdown,
        _dir: dir,
    }
}

/// HTTP client that never goes through a system proxy or reuses connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Value of `http_requests_total` for the given labels, 0 when absent.
#[allow(dead_code)]
pub fn requests_total(rendered: &str, method: &str, path: &str, status: &str) -> f64 {
    let wanted = [
        format!(r#"method="{method}""#),
        format!(r#"path="{path}""#),
        format!(r#"status="{status}""#),
    ];
    rendered
        .lines()
        .filter(|line| line.starts_with("http_requests_total{"))
        .find(|line| wanted.iter().all(|label| line.contains(label.as_str())))
        .and_then(|line| line.rsplit(' ').next())
        .map(|value| value.parse().unwrap())
        .unwrap_or(0.0)
}
