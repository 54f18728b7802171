//! Task status enumeration.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Actively being worked on.
    InProgress,
    /// Finished; excluded from due-date checks.
    Completed,
}

impl TaskStatus {
    /// Whether a task in this status is still open for due-date checks.
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Completed)
    }
}
