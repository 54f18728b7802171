//! The event descriptor submitted by business operations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use taskhub_core::AppError;
use taskhub_core::types::id::{TaskId, TenantId, UserId};
use taskhub_entity::notification::model::{
    MAX_MESSAGE_LEN, MAX_TITLE_LEN, NewNotification,
};
use taskhub_entity::notification::NotificationKind;

/// A notification event as produced inside a business operation.
///
/// Collaborators decide *whether* and *to whom* to notify; this descriptor
/// only carries what the delivery engine needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Recipient user.
    pub user_id: UserId,
    /// Recipient's tenant.
    pub tenant_id: TenantId,
    /// Event kind.
    pub kind: NotificationKind,
    /// Title, at most 200 characters.
    pub title: String,
    /// Body, at most 500 characters.
    pub message: String,
    /// Originating task, if any.
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// Acting identity, if any.
    #[serde(default)]
    pub triggered_by: Option<UserId>,
    /// Scalar metadata, pre-serialized to strings for the push channel.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl NotificationEvent {
    /// Validate field constraints before persistence.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.is_empty() {
            return Err(AppError::validation("notification title must not be empty"));
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::validation(format!(
                "notification title exceeds {MAX_TITLE_LEN} characters"
            )));
        }
        if self.message.chars().count() > MAX_MESSAGE_LEN {
            return Err(AppError::validation(format!(
                "notification message exceeds {MAX_MESSAGE_LEN} characters"
            )));
        }
        Ok(())
    }

    /// Convert into the store's insert payload.
    pub fn into_record(self) -> NewNotification {
        NewNotification {
            user_id: self.user_id.into_uuid(),
            tenant_id: self.tenant_id.into_uuid(),
            kind: self.kind,
            title: self.title,
            message: self.message,
            task_id: self.task_id.map(TaskId::into_uuid),
            triggered_by: self.triggered_by.map(UserId::into_uuid),
            metadata: self.metadata,
        }
    }

    /// Re-target the same event at a different recipient.
    pub fn for_recipient(&self, user_id: UserId) -> Self {
        let mut event = self.clone();
        event.user_id = user_id;
        event
    }
}
