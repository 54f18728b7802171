//! Task entity model.
//!
//! Task CRUD lives outside the delivery engine; this projection carries
//! only the fields the due-date scanner needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::TaskStatus;

/// A task as seen by the due-date scanner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique task identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// The user the task is assigned to.
    pub assignee_id: Uuid,
    /// Task title, reused in due-date notification copy.
    pub title: String,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Due date, if one is set.
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Whether the task participates in due-date checks.
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}
