//! Task domain model.
//!
//! # Responsibility
//! - Define the single persisted record of the system.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `title`/`description` are always present; empty string means "not set".

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a task record.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = Uuid;

/// Canonical to-do record.
///
/// The store partitions the collection into active and completed views by
/// the `completed` field; no other derived state exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable global ID, generated at creation, immutable.
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub favorite: bool,
    pub completed: bool,
}

impl Task {
    /// Creates a new task with a generated stable ID and default flags.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, description)
    }

    /// Creates a task with a caller-provided stable ID.
    ///
    /// Used by callers that already hold an identity, such as the FFI update
    /// path or tests needing deterministic IDs.
    pub fn with_id(
        id: TaskId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            favorite: false,
            completed: false,
        }
    }

    /// Returns whether this task belongs to the active view.
    pub fn is_active(&self) -> bool {
        !self.completed
    }
}
