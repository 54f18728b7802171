//! Notification kind enumeration.

use serde::{Deserialize, Serialize};

/// Closed set of notification kinds.
///
/// Maps to the `notification_kind` Postgres enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
pub enum NotificationKind {
    /// A task was assigned to the recipient.
    TaskAssigned,
    /// A task the recipient follows was updated.
    TaskUpdated,
    /// A task was marked completed.
    TaskCompleted,
    /// A task was deleted.
    TaskDeleted,
    /// A task's due date falls within the soon-window.
    TaskDueSoon,
    /// A task's due date has passed.
    TaskOverdue,
    /// A comment was added to a task.
    CommentAdded,
    /// The recipient was mentioned.
    Mention,
}

impl NotificationKind {
    /// Return the kind as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskAssigned => "task_assigned",
            Self::TaskUpdated => "task_updated",
            Self::TaskCompleted => "task_completed",
            Self::TaskDeleted => "task_deleted",
            Self::TaskDueSoon => "task_due_soon",
            Self::TaskOverdue => "task_overdue",
            Self::CommentAdded => "comment_added",
            Self::Mention => "mention",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
