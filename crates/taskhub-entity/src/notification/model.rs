//! Notification entity model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
pub use sqlx::types::Json;
use uuid::Uuid;

use super::kind::NotificationKind;

/// Maximum title length accepted at event intake.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum message length accepted at event intake.
pub const MAX_MESSAGE_LEN: usize = 500;

/// A durable notification delivered to a user.
///
/// Immutable after creation except for the read flag, which only
/// transitions false to true.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// The recipient user. Never changes after creation.
    pub user_id: Uuid,
    /// The recipient's tenant. Never changes after creation.
    pub tenant_id: Uuid,
    /// Kind of event that produced this notification.
    pub kind: NotificationKind,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub message: String,
    /// The originating task, if any.
    pub task_id: Option<Uuid>,
    /// The acting identity that triggered the event, if any.
    pub triggered_by: Option<Uuid>,
    /// Open string-keyed metadata; values are pre-serialized to strings
    /// so the push channel can carry them verbatim.
    pub metadata: Json<HashMap<String, String>>,
    /// Whether the user has read this notification.
    pub is_read: bool,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the read flag last changed.
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Check whether the notification is still unread.
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }
}

/// Insert payload for a new notification. The store assigns `id`,
/// `created_at`, and `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    /// The recipient user.
    pub user_id: Uuid,
    /// The recipient's tenant.
    pub tenant_id: Uuid,
    /// Kind of event.
    pub kind: NotificationKind,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub message: String,
    /// The originating task, if any.
    pub task_id: Option<Uuid>,
    /// The acting identity, if any.
    pub triggered_by: Option<Uuid>,
    /// Pre-serialized string metadata.
    pub metadata: HashMap<String, String>,
}
