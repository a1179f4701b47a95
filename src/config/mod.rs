//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (--config / TASK_SERVICE_CONFIG)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (OTEL_*, DB_PATH, ...)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so the service runs with no config at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, CONFIG_PATH_ENV};
pub use schema::{AppConfig, LogFormat, ServerConfig, StorageConfig, TelemetryConfig};
