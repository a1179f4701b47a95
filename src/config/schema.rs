//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the task service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener and request limits.
    pub server: ServerConfig,

    /// Database location.
    pub storage: StorageConfig,

    /// Logging and tracing settings.
    pub telemetry: TelemetryConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file. The parent directory is created on demand.
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "data/app.db".to_string(),
        }
    }
}

/// Output format for the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format '{other}' (expected json or pretty)")),
        }
    }
}

/// Logging and distributed tracing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Export spans over OTLP.
    pub tracing_enabled: bool,

    /// `service.name` resource attribute.
    pub service_name: String,

    /// OTLP/HTTP traces endpoint.
    pub exporter_endpoint: String,

    /// Default log filter (overridden by RUST_LOG).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tracing_enabled: true,
            service_name: "devops-fastapi-project".to_string(),
            exporter_endpoint: "http://localhost:4318/v1/traces".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8000");
        assert_eq!(config.storage.db_path, "data/app.db");
        assert!(config.telemetry.tracing_enabled);
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [telemetry]
            tracing_enabled = false
            log_format = "pretty"

            [storage]
            db_path = "/var/lib/tasks/tasks.db"
            "#,
        )
        .unwrap();
        assert!(!config.telemetry.tracing_enabled);
        assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
        assert_eq!(config.telemetry.service_name, "devops-fastapi-project");
        assert_eq!(config.storage.db_path, "/var/lib/tasks/tasks.db");
        assert_eq!(config.server.request_timeout_secs, 30);
    }
}
