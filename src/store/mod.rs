//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! Handler
//!     → TaskStore::run (blocking pool)
//!     → open_connection (fresh SQLite handle)
//!     → single-row statement(s)
//!     → connection dropped
//! ```
//!
//! # Design Decisions
//! - No pooling: a connection is opened and closed per request
//! - No multi-statement transactions; SQLite serializes writers
//! - Schema creation runs once at startup and is fatal on failure

pub mod sqlite;
pub mod task;

use std::path::PathBuf;

pub use sqlite::{StoreConnection, TaskStore};
pub use task::{Task, TaskStatus};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the store accessor.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create storage directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open database {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("task {0} not found")]
    NotFound(i64),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}
