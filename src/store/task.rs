//! Task entity and its lifecycle.
//!
//! # Invariants
//! - `id` is assigned by the store and never reused.
//! - `title` is 1..=200 characters once persisted.
//! - `done` only moves forward: Pending → Done.

use serde::{Deserialize, Serialize};

/// Minimum accepted title length, in characters.
pub const TITLE_MIN_CHARS: usize = 1;

/// Maximum accepted title length, in characters.
pub const TITLE_MAX_CHARS: usize = 200;

/// A persisted to-do item.
///
/// Serializes `done` as `0`/`1` to match the column representation clients
/// already consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(with = "done_flag")]
    pub done: bool,
    pub created_at: String,
}

impl Task {
    /// Current lifecycle state.
    pub fn status(&self) -> TaskStatus {
        if self.done {
            TaskStatus::Done
        } else {
            TaskStatus::Pending
        }
    }
}

/// Lifecycle state derived from the `done` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Created, not yet completed.
    Pending,
    /// Completed. Terminal.
    Done,
}

/// Why a title was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleViolation {
    TooShort,
    TooLong,
}

/// Check a title against the length bounds. Counts characters, not bytes.
pub fn validate_title(title: &str) -> Result<(), TitleViolation> {
    let len = title.chars().count();
    if len < TITLE_MIN_CHARS {
        Err(TitleViolation::TooShort)
    } else if len > TITLE_MAX_CHARS {
        Err(TitleViolation::TooLong)
    } else {
        Ok(())
    }
}

mod done_flag {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(done: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*done))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(de::Error::custom(format!("done flag must be 0 or 1, got {other}"))),
        }
    }
}
