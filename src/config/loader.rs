//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "TASK_SERVICE_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {message}")]
    Env { var: &'static str, message: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: file (if any) → environment overrides → `bind`
/// override → validation.
pub fn load_config(path: Option<&Path>, bind: Option<&str>) -> Result<AppConfig, ConfigError> {
    resolve_config(path, bind, |var| std::env::var(var).ok())
}

fn resolve_config<F>(path: Option<&Path>, bind: Option<&str>, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    if let Some(bind) = bind {
        config.server.bind_address = bind.to_string();
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts `std::env::var` so overrides can be exercised without
/// touching the process environment.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("OTEL_TRACING_ENABLED") {
        // Anything other than "true" disables export.
        config.telemetry.tracing_enabled = value.trim().eq_ignore_ascii_case("true");
    }
    if let Some(value) = lookup("OTEL_SERVICE_NAME") {
        config.telemetry.service_name = value;
    }
    if let Some(value) = lookup("OTEL_EXPORTER_OTLP_ENDPOINT") {
        config.telemetry.exporter_endpoint = value;
    }
    if let Some(value) = lookup("LOG_FORMAT") {
        config.telemetry.log_format = value.parse().map_err(|message| ConfigError::Env {
            var: "LOG_FORMAT",
            message,
        })?;
    }
    if let Some(value) = lookup("DB_PATH") {
        config.storage.db_path = value;
    }
    if let Some(value) = lookup("BIND_ADDRESS") {
        config.server.bind_address = value;
    }
    Ok(())
}
