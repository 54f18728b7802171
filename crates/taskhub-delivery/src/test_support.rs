//! In-memory fakes for the delivery ports, shared by the crate's tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use taskhub_core::{AppError, AppResult};
use taskhub_core::types::id::{TaskId, TenantId, UserId};
use taskhub_core::types::pagination::{PageRequest, PageResponse};
use taskhub_entity::notification::model::Json;
use taskhub_entity::notification::{NewNotification, Notification, NotificationKind};
use taskhub_entity::task::{Task, TaskStatus};

use crate::event::NotificationEvent;
use crate::ports::{
    DeliveryStatus, DeviceRegistry, LiveBroadcaster, MulticastOutcome, NotificationFilter,
    NotificationStore, PushGateway, PushMessage, TaskSource, TenantDirectory, TokenDelivery,
};

/// A ready-made valid event.
pub fn sample_event() -> NotificationEvent {
    NotificationEvent {
        user_id: UserId::new(),
        tenant_id: TenantId::new(),
        kind: NotificationKind::TaskAssigned,
        title: "Task assigned".to_string(),
        message: "You have been assigned 'Ship the release'".to_string(),
        task_id: Some(TaskId::new()),
        triggered_by: Some(UserId::new()),
        metadata: HashMap::new(),
    }
}

/// An open task owned by a fresh user/tenant with the given status and due date.
pub fn open_task(status: TaskStatus, due_date: Option<DateTime<Utc>>) -> Task {
    Task {
        id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        assignee_id: Uuid::new_v4(),
        title: "Ship the release".to_string(),
        status,
        due_date,
    }
}

/// In-memory [`NotificationStore`] with injectable append failures.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<Vec<Notification>>,
    fail_next: AtomicBool,
    fail_users: Mutex<HashSet<Uuid>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `append` fail.
    pub fn fail_next_append(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Make every `append` for the given user fail.
    pub fn fail_appends_for(&self, user_id: UserId) {
        self.fail_users.lock().unwrap().insert(user_id.into_uuid());
    }

    /// Snapshot of a user's records, newest first.
    pub fn records_for(&self, user_id: UserId) -> Vec<Notification> {
        let mut records: Vec<Notification> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id.into_uuid())
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }
}

#[async_trait]
impl NotificationStore for InMemoryStore {
    async fn append(&self, record: NewNotification) -> AppResult<Notification> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AppError::database("injected append failure"));
        }
        if self.fail_users.lock().unwrap().contains(&record.user_id) {
            return Err(AppError::database("injected append failure for user"));
        }
        let now = Utc::now();
        let stored = Notification {
            id: Uuid::new_v4(),
            user_id: record.user_id,
            tenant_id: record.tenant_id,
            kind: record.kind,
            title: record.title,
            message: record.message,
            task_id: record.task_id,
            triggered_by: record.triggered_by,
            metadata: Json(record.metadata),
            is_read: false,
            created_at: now,
            updated_at: now,
        };
        self.records.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let mut items: Vec<Notification> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id.into_uuid())
            .filter(|n| filter.is_read.is_none_or(|r| n.is_read == r))
            .filter(|n| filter.kind.is_none_or(|k| n.kind == k))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn count_unread(&self, user_id: UserId) -> AppResult<i64> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id.into_uuid() && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(&self, user_id: UserId, ids: &[Uuid]) -> AppResult<u64> {
        let mut records = self.records.lock().unwrap();
        let mut count = 0;
        for record in records.iter_mut() {
            if record.user_id == user_id.into_uuid() && ids.contains(&record.id) && !record.is_read
            {
                record.is_read = true;
                record.updated_at = Utc::now();
                count += 1;
            }
        }
        Ok(count)
    }

    async fn mark_all_read(&self, user_id: UserId) -> AppResult<u64> {
        let ids: Vec<Uuid> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id.into_uuid() && !n.is_read)
            .map(|n| n.id)
            .collect();
        self.mark_read(user_id, &ids).await
    }

    async fn delete(&self, user_id: UserId, id: Uuid) -> AppResult<bool> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|n| !(n.user_id == user_id.into_uuid() && n.id == id));
        Ok(records.len() < before)
    }

    async fn delete_all_read(&self, user_id: UserId) -> AppResult<u64> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|n| !(n.user_id == user_id.into_uuid() && n.is_read));
        Ok((before - records.len()) as u64)
    }

    async fn exists_since(
        &self,
        user_id: UserId,
        task_id: TaskId,
        kind: NotificationKind,
        since: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self.records.lock().unwrap().iter().any(|n| {
            n.user_id == user_id.into_uuid()
                && n.task_id == Some(task_id.into_uuid())
                && n.kind == kind
                && n.created_at >= since
        }))
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|n| n.created_at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}

/// In-memory [`DeviceRegistry`] backed by per-user token sets.
#[derive(Default)]
pub struct FakeDeviceRegistry {
    tokens: Mutex<HashMap<Uuid, Vec<String>>>,
}

impl FakeDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceRegistry for FakeDeviceRegistry {
    async fn add_token(&self, user_id: UserId, token: &str) -> AppResult<()> {
        let mut tokens = self.tokens.lock().unwrap();
        let entry = tokens.entry(user_id.into_uuid()).or_default();
        if !entry.iter().any(|t| t == token) {
            entry.push(token.to_string());
        }
        Ok(())
    }

    async fn remove_tokens(&self, user_id: UserId, to_remove: &[String]) -> AppResult<()> {
        if let Some(entry) = self.tokens.lock().unwrap().get_mut(&user_id.into_uuid()) {
            entry.retain(|t| !to_remove.contains(t));
        }
        Ok(())
    }

    async fn tokens_for(&self, user_id: UserId) -> AppResult<Vec<String>> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .get(&user_id.into_uuid())
            .cloned()
            .unwrap_or_default())
    }
}

/// Scripted [`PushGateway`]: per-token failure modes plus an unavailable switch.
#[derive(Default)]
pub struct FakePushGateway {
    permanent: Mutex<HashSet<String>>,
    transient: Mutex<HashSet<String>>,
    unavailable: Mutex<Option<String>>,
    calls: AtomicUsize,
    last_message: Mutex<Option<PushMessage>>,
}

impl FakePushGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_permanently(&self, token: &str) {
        self.permanent.lock().unwrap().insert(token.to_string());
    }

    pub fn fail_transiently(&self, token: &str) {
        self.transient.lock().unwrap().insert(token.to_string());
    }

    pub fn set_unavailable(&self, reason: &str) {
        *self.unavailable.lock().unwrap() = Some(reason.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_message(&self) -> Option<PushMessage> {
        self.last_message.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushGateway for FakePushGateway {
    async fn send_multicast(&self, tokens: &[String], message: &PushMessage) -> MulticastOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_message.lock().unwrap() = Some(message.clone());

        if let Some(reason) = self.unavailable.lock().unwrap().clone() {
            return MulticastOutcome::Unavailable(reason);
        }

        let permanent = self.permanent.lock().unwrap();
        let transient = self.transient.lock().unwrap();
        let results = tokens
            .iter()
            .map(|token| TokenDelivery {
                token: token.clone(),
                status: if permanent.contains(token) {
                    DeliveryStatus::PermanentFailure("unregistered".to_string())
                } else if transient.contains(token) {
                    DeliveryStatus::TransientFailure
                } else {
                    DeliveryStatus::Delivered
                },
            })
            .collect();
        MulticastOutcome::Sent(results)
    }
}

/// Recording [`LiveBroadcaster`] with an injectable failure switch.
#[derive(Default)]
pub struct FakeBroadcaster {
    user_frames: Mutex<Vec<(Uuid, Notification)>>,
    tenant_frames: Mutex<Vec<(Uuid, Notification)>>,
    fail: AtomicBool,
}

impl FakeBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_broadcasts(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn user_frames(&self, user_id: UserId) -> Vec<Notification> {
        self.user_frames
            .lock()
            .unwrap()
            .iter()
            .filter(|(uid, _)| *uid == user_id.into_uuid())
            .map(|(_, n)| n.clone())
            .collect()
    }

    pub fn all_user_frames(&self) -> Vec<Notification> {
        self.user_frames
            .lock()
            .unwrap()
            .iter()
            .map(|(_, n)| n.clone())
            .collect()
    }

    pub fn tenant_frames(&self, tenant_id: TenantId) -> Vec<Notification> {
        self.tenant_frames
            .lock()
            .unwrap()
            .iter()
            .filter(|(tid, _)| *tid == tenant_id.into_uuid())
            .map(|(_, n)| n.clone())
            .collect()
    }
}

#[async_trait]
impl LiveBroadcaster for FakeBroadcaster {
    async fn broadcast_to_user(
        &self,
        user_id: UserId,
        notification: &Notification,
    ) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::internal("injected broadcast failure"));
        }
        self.user_frames
            .lock()
            .unwrap()
            .push((user_id.into_uuid(), notification.clone()));
        Ok(())
    }

    async fn broadcast_to_tenant(
        &self,
        tenant_id: TenantId,
        notification: &Notification,
    ) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::internal("injected broadcast failure"));
        }
        self.tenant_frames
            .lock()
            .unwrap()
            .push((tenant_id.into_uuid(), notification.clone()));
        Ok(())
    }
}

/// Static [`TenantDirectory`].
#[derive(Default)]
pub struct FakeTenantDirectory {
    members: Mutex<HashMap<Uuid, Vec<UserId>>>,
}

impl FakeTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_members(&self, tenant_id: TenantId, members: Vec<UserId>) {
        self.members
            .lock()
            .unwrap()
            .insert(tenant_id.into_uuid(), members);
    }
}

#[async_trait]
impl TenantDirectory for FakeTenantDirectory {
    async fn user_ids_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<UserId>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .get(&tenant_id.into_uuid())
            .cloned()
            .unwrap_or_default())
    }
}

/// Static [`TaskSource`].
pub struct FakeTaskSource {
    tasks: Vec<Task>,
}

impl FakeTaskSource {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }
}

#[async_trait]
impl TaskSource for FakeTaskSource {
    async fn open_tasks_with_due_dates(&self) -> AppResult<Vec<Task>> {
        Ok(self
            .tasks
            .iter()
            .filter(|t| t.is_open() && t.due_date.is_some())
            .cloned()
            .collect())
    }

    async fn find_task(&self, task_id: TaskId) -> AppResult<Option<Task>> {
        Ok(self
            .tasks
            .iter()
            .find(|t| t.id == task_id.into_uuid())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The in-memory store mirrors the contract the Postgres repository
    // implements, so the scoping rules are checked here once.

    #[tokio::test]
    async fn unread_count_tracks_read_transitions() {
        let store = InMemoryStore::new();
        let event = sample_event();
        let a = store.append(event.clone().into_record()).await.unwrap();
        let _b = store.append(event.clone().into_record()).await.unwrap();

        assert_eq!(store.count_unread(event.user_id).await.unwrap(), 2);

        store.mark_read(event.user_id, &[a.id]).await.unwrap();
        assert_eq!(store.count_unread(event.user_id).await.unwrap(), 1);

        store.mark_all_read(event.user_id).await.unwrap();
        assert_eq!(store.count_unread(event.user_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn mark_read_ignores_foreign_ids_but_honors_owned_ones() {
        let store = InMemoryStore::new();
        let mine = sample_event();
        let theirs = sample_event();
        let my_record = store.append(mine.clone().into_record()).await.unwrap();
        let their_record = store.append(theirs.clone().into_record()).await.unwrap();

        let count = store
            .mark_read(mine.user_id, &[my_record.id, their_record.id])
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(store.count_unread(theirs.user_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_is_owner_scoped() {
        let store = InMemoryStore::new();
        let mine = sample_event();
        let theirs = sample_event();
        let _my_record = store.append(mine.clone().into_record()).await.unwrap();
        let their_record = store.append(theirs.clone().into_record()).await.unwrap();

        assert!(!store.delete(mine.user_id, their_record.id).await.unwrap());
        assert_eq!(store.records_for(theirs.user_id).len(), 1);
    }

    #[tokio::test]
    async fn list_filters_by_read_state_and_kind() {
        let store = InMemoryStore::new();
        let event = sample_event();
        let read_one = store.append(event.clone().into_record()).await.unwrap();
        let mut mention = event.clone();
        mention.kind = NotificationKind::Mention;
        store.append(mention.into_record()).await.unwrap();
        store.mark_read(event.user_id, &[read_one.id]).await.unwrap();

        let unread = store
            .list_by_user(
                event.user_id,
                &NotificationFilter {
                    is_read: Some(false),
                    kind: None,
                },
                &PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(unread.items.len(), 1);
        assert_eq!(unread.items[0].kind, NotificationKind::Mention);

        let mentions = store
            .list_by_user(
                event.user_id,
                &NotificationFilter {
                    is_read: None,
                    kind: Some(NotificationKind::Mention),
                },
                &PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(mentions.total_items, 1);
    }

    #[tokio::test]
    async fn device_registry_tokens_form_a_set() {
        let registry = FakeDeviceRegistry::new();
        let user = UserId::new();

        for _ in 0..3 {
            registry.add_token(user, "same-token").await.unwrap();
        }

        assert_eq!(registry.tokens_for(user).await.unwrap().len(), 1);
    }
}
