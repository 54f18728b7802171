//! Port traits the delivery engine is wired against.
//!
//! Concrete implementations live in `taskhub-database` (store, device
//! registry, tenant directory, task source), `taskhub-push` (gateway), and
//! `taskhub-realtime` (live broadcaster). Tests use in-memory fakes.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taskhub_core::AppResult;
use taskhub_core::types::id::{TaskId, TenantId, UserId};
use taskhub_core::types::pagination::{PageRequest, PageResponse};
use taskhub_entity::notification::{NewNotification, Notification, NotificationKind};
use taskhub_entity::task::Task;

/// Read-state/kind filter for notification listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationFilter {
    /// Restrict to read or unread records.
    pub is_read: Option<bool>,
    /// Restrict to a single kind.
    pub kind: Option<NotificationKind>,
}

/// Durable, per-user notification record store.
///
/// Every operation is scoped to the calling user; acting on another user's
/// record is a no-op, never a cross-tenant leak.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Append a new record; the store assigns id and timestamps.
    async fn append(&self, record: NewNotification) -> AppResult<Notification>;

    /// List a user's notifications, newest first.
    async fn list_by_user(
        &self,
        user_id: UserId,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>>;

    /// Count a user's unread notifications.
    async fn count_unread(&self, user_id: UserId) -> AppResult<i64>;

    /// Mark the given notifications read. Ids not owned by `user_id` are
    /// skipped; returns the number of rows actually transitioned.
    async fn mark_read(&self, user_id: UserId, ids: &[Uuid]) -> AppResult<u64>;

    /// Mark all of a user's notifications read; returns the count.
    async fn mark_all_read(&self, user_id: UserId) -> AppResult<u64>;

    /// Delete one owned notification. Returns `false` when nothing matched.
    async fn delete(&self, user_id: UserId, id: Uuid) -> AppResult<bool>;

    /// Delete all of a user's read notifications; returns the count.
    async fn delete_all_read(&self, user_id: UserId) -> AppResult<u64>;

    /// Whether a notification of `kind` for `task_id` was created for
    /// `user_id` at or after `since`. Used by the scanner's cooldown.
    async fn exists_since(
        &self,
        user_id: UserId,
        task_id: TaskId,
        kind: NotificationKind,
        since: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Purge records created before `cutoff`. Reaper-only.
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

/// Per-user set of push-reachable device endpoints.
#[async_trait]
pub trait DeviceRegistry: Send + Sync + 'static {
    /// Idempotent set-insert; re-registering an existing token is a no-op.
    async fn add_token(&self, user_id: UserId, token: &str) -> AppResult<()>;

    /// Idempotent set-removal.
    async fn remove_tokens(&self, user_id: UserId, tokens: &[String]) -> AppResult<()>;

    /// All tokens registered for a user.
    async fn tokens_for(&self, user_id: UserId) -> AppResult<Vec<String>>;
}

/// Push payload: title/body plus string-valued data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// String-valued data map carried alongside the notification.
    pub data: HashMap<String, String>,
}

/// Delivery status for a single device token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The gateway accepted the message for this token.
    Delivered,
    /// The attempt failed but the token may still be valid.
    TransientFailure,
    /// The token is invalid or unregistered and will never succeed.
    PermanentFailure(String),
}

/// Per-token result of a multicast attempt.
#[derive(Debug, Clone)]
pub struct TokenDelivery {
    /// The device token this result applies to.
    pub token: String,
    /// What happened for this token.
    pub status: DeliveryStatus,
}

/// Overall outcome of a multicast call.
#[derive(Debug, Clone)]
pub enum MulticastOutcome {
    /// The gateway was reached; per-token results follow.
    Sent(Vec<TokenDelivery>),
    /// The gateway could not be reached at all (no credentials, DNS,
    /// connect timeout). No per-token conclusions may be drawn.
    Unavailable(String),
}

/// Stateless adapter multicasting one message to a batch of device tokens.
///
/// The client never retries internally; retry policy belongs to the caller.
#[async_trait]
pub trait PushGateway: Send + Sync + 'static {
    /// Send `message` to every token in `tokens`.
    async fn send_multicast(&self, tokens: &[String], message: &PushMessage) -> MulticastOutcome;
}

/// Fan-out to currently-connected live sessions.
#[async_trait]
pub trait LiveBroadcaster: Send + Sync + 'static {
    /// Broadcast to all of a user's live sessions. Zero sessions is a no-op.
    async fn broadcast_to_user(&self, user_id: UserId, notification: &Notification)
    -> AppResult<()>;

    /// Broadcast to every live session in a tenant's room.
    async fn broadcast_to_tenant(
        &self,
        tenant_id: TenantId,
        notification: &Notification,
    ) -> AppResult<()>;
}

/// Resolves tenant membership for tenant-wide delivery.
#[async_trait]
pub trait TenantDirectory: Send + Sync + 'static {
    /// All users belonging to a tenant.
    async fn user_ids_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<UserId>>;
}

/// Read access to tasks for the due-date scanner.
#[async_trait]
pub trait TaskSource: Send + Sync + 'static {
    /// All open (non-completed) tasks that carry a due date.
    async fn open_tasks_with_due_dates(&self) -> AppResult<Vec<Task>>;

    /// A single task, for the post-mutation check.
    async fn find_task(&self, task_id: TaskId) -> AppResult<Option<Task>>;
}
