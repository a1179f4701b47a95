//! Task service library: HTTP CRUD over tasks with metrics, logs, and traces.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::{Task, TaskStore};
