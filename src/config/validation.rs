//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges and formats. All failures
//! are collected so a bad config is reported in one pass.

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::AppConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check the whole configuration, returning every violation found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::new(
            "server.max_body_bytes",
            "must be greater than zero",
        ));
    }

    if config.storage.db_path.trim().is_empty() {
        errors.push(ValidationError::new("storage.db_path", "must not be empty"));
    }

    let telemetry = &config.telemetry;
    if telemetry.service_name.trim().is_empty() {
        errors.push(ValidationError::new(
            "telemetry.service_name",
            "must not be empty",
        ));
    }
    // The endpoint only matters when something will be exported to it.
    if telemetry.tracing_enabled {
        match Url::parse(&telemetry.exporter_endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                "telemetry.exporter_endpoint",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(
                "telemetry.exporter_endpoint",
                format!("invalid URL: {e}"),
            )),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_violation() {
        let mut config = AppConfig::default();
        config.server.bind_address = "not-an-address".to_string();
        config.server.request_timeout_secs = 0;
        config.storage.db_path = "  ".to_string();
        config.telemetry.exporter_endpoint = "ftp://collector".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "server.bind_address",
                "server.request_timeout_secs",
                "storage.db_path",
                "telemetry.exporter_endpoint",
            ]
        );
    }

    #[test]
    fn endpoint_ignored_when_tracing_disabled() {
        let mut config = AppConfig::default();
        config.telemetry.tracing_enabled = false;
        config.telemetry.exporter_endpoint = "::garbage::".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
