//! Delivery dispatcher: the single entry point business operations call.
//!
//! Each delivery step carries its own failure boundary: persistence failure
//! is the only error surfaced to the caller; live broadcast and push are
//! best-effort once the durable record exists.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use taskhub_core::{AppError, AppResult};
use taskhub_core::types::id::{TenantId, UserId};
use taskhub_entity::notification::Notification;

use crate::event::NotificationEvent;
use crate::ports::{
    DeliveryStatus, DeviceRegistry, LiveBroadcaster, MulticastOutcome, NotificationStore,
    PushGateway, PushMessage, TenantDirectory,
};

/// Summary of one push fan-out attempt, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushSummary {
    /// Tokens the multicast was attempted against.
    pub attempted: usize,
    /// Tokens the gateway accepted.
    pub delivered: usize,
    /// Tokens that failed transiently and were kept.
    pub transient: usize,
    /// Tokens pruned after a permanent failure.
    pub pruned: usize,
}

/// Orchestrates persistence, live fan-out, and push delivery for events.
///
/// Constructed once at process start with injected dependencies and passed
/// by handle to whatever owns the network listener and the scheduler.
pub struct DeliveryDispatcher {
    store: Arc<dyn NotificationStore>,
    devices: Arc<dyn DeviceRegistry>,
    push: Arc<dyn PushGateway>,
    live: Arc<dyn LiveBroadcaster>,
    tenants: Arc<dyn TenantDirectory>,
}

impl DeliveryDispatcher {
    /// Create a dispatcher over the given ports.
    pub fn new(
        store: Arc<dyn NotificationStore>,
        devices: Arc<dyn DeviceRegistry>,
        push: Arc<dyn PushGateway>,
        live: Arc<dyn LiveBroadcaster>,
        tenants: Arc<dyn TenantDirectory>,
    ) -> Self {
        Self {
            store,
            devices,
            push,
            live,
            tenants,
        }
    }

    /// Deliver an event to a single user.
    ///
    /// Persists the record (failures propagate), broadcasts it to the
    /// user's live sessions (failures logged), then fans push delivery out
    /// in the background (never affects the caller).
    pub async fn notify(&self, event: NotificationEvent) -> AppResult<Notification> {
        event.validate()?;
        let user_id = event.user_id;

        let stored = self.store.append(event.into_record()).await?;
        debug!(
            notification_id = %stored.id,
            user_id = %user_id,
            kind = %stored.kind,
            "Notification persisted"
        );

        if let Err(e) = self.live.broadcast_to_user(user_id, &stored).await {
            warn!(
                notification_id = %stored.id,
                user_id = %user_id,
                error = %e,
                "Live broadcast failed; record remains durable"
            );
        }

        self.spawn_push(vec![stored.clone()]);

        Ok(stored)
    }

    /// Deliver an event to every member of a tenant.
    ///
    /// One record is persisted per member so each member's unread count
    /// reflects the notification. The tenant room receives a single frame
    /// carrying one representative record; its `id` is only owned by that
    /// member, so clients acknowledge from their own unread sync rather
    /// than from the tenant frame. Push fans out per member with partial
    /// failure tolerated.
    pub async fn notify_tenant(&self, event: NotificationEvent) -> AppResult<Vec<Notification>> {
        event.validate()?;
        let tenant_id = event.tenant_id;

        let members = self.tenants.user_ids_for_tenant(tenant_id).await?;
        if members.is_empty() {
            debug!(tenant_id = %tenant_id, "Tenant has no members; nothing to deliver");
            return Ok(Vec::new());
        }

        let mut stored = Vec::with_capacity(members.len());
        for member in members {
            let record = event.for_recipient(member).into_record();
            match self.store.append(record).await {
                Ok(n) => stored.push(n),
                Err(e) => warn!(
                    tenant_id = %tenant_id,
                    user_id = %member,
                    error = %e,
                    "Failed to persist tenant notification for member"
                ),
            }
        }
        if stored.is_empty() {
            return Err(AppError::internal(
                "tenant notification could not be persisted for any member",
            ));
        }

        // One frame to the tenant room, attributed to the event's nominal
        // recipient when that member was persisted.
        let frame = stored
            .iter()
            .find(|n| n.user_id == event.user_id.into_uuid())
            .unwrap_or(&stored[0]);
        if let Err(e) = self.live.broadcast_to_tenant(tenant_id, frame).await {
            warn!(tenant_id = %tenant_id, error = %e, "Tenant live broadcast failed");
        }

        self.spawn_push(stored.clone());

        Ok(stored)
    }

    /// Register a device token for push delivery. Idempotent.
    pub async fn register_device_token(&self, user_id: UserId, token: &str) -> AppResult<()> {
        self.devices.add_token(user_id, token).await
    }

    /// Submit push fan-out as a background task with its own error
    /// boundary, so a slow gateway never blocks the triggering operation.
    fn spawn_push(&self, notifications: Vec<Notification>) {
        let devices = Arc::clone(&self.devices);
        let push = Arc::clone(&self.push);
        tokio::spawn(async move {
            let mut total = PushSummary::default();
            let count = notifications.len();
            for notification in &notifications {
                let summary = push_to_user(&*devices, &*push, notification).await;
                total.attempted += summary.attempted;
                total.delivered += summary.delivered;
                total.transient += summary.transient;
                total.pruned += summary.pruned;
            }
            if total.attempted > 0 {
                info!(
                    recipients = count,
                    attempted = total.attempted,
                    delivered = total.delivered,
                    transient = total.transient,
                    pruned = total.pruned,
                    "Push fan-out finished"
                );
            }
        });
    }

    /// Synchronous push fan-out for a single record. Exposed to the crate
    /// so tests can exercise push semantics deterministically.
    pub(crate) async fn push_for(&self, notification: &Notification) -> PushSummary {
        push_to_user(&*self.devices, &*self.push, notification).await
    }
}

/// Push one notification to all of a user's registered devices.
///
/// Empty token set: stop, not an error. Unavailable gateway: log and move
/// on. Permanent per-token failures are the only pruning trigger.
async fn push_to_user(
    devices: &dyn DeviceRegistry,
    push: &dyn PushGateway,
    notification: &Notification,
) -> PushSummary {
    let user_id = UserId::from_uuid(notification.user_id);

    let tokens = match devices.tokens_for(user_id).await {
        Ok(t) => t,
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Device token lookup failed; skipping push");
            return PushSummary::default();
        }
    };
    if tokens.is_empty() {
        return PushSummary::default();
    }

    let message = push_message(notification);
    let mut summary = PushSummary {
        attempted: tokens.len(),
        ..PushSummary::default()
    };

    match push.send_multicast(&tokens, &message).await {
        MulticastOutcome::Unavailable(reason) => {
            warn!(
                user_id = %user_id,
                reason = %reason,
                "Push gateway unavailable; tokens preserved"
            );
        }
        MulticastOutcome::Sent(results) => {
            let mut invalid = Vec::new();
            for result in results {
                match result.status {
                    DeliveryStatus::Delivered => summary.delivered += 1,
                    DeliveryStatus::TransientFailure => summary.transient += 1,
                    DeliveryStatus::PermanentFailure(reason) => {
                        debug!(
                            user_id = %user_id,
                            reason = %reason,
                            "Pruning permanently failed device token"
                        );
                        invalid.push(result.token);
                    }
                }
            }
            if !invalid.is_empty() {
                summary.pruned = invalid.len();
                if let Err(e) = devices.remove_tokens(user_id, &invalid).await {
                    warn!(user_id = %user_id, error = %e, "Failed to prune invalid tokens");
                }
            }
        }
    }

    summary
}

/// Build the push payload: metadata verbatim, plus `task_id` and `type`.
fn push_message(notification: &Notification) -> PushMessage {
    let mut data: HashMap<String, String> = notification.metadata.0.clone();
    if let Some(task_id) = notification.task_id {
        data.insert("task_id".to_string(), task_id.to_string());
    }
    data.insert("type".to_string(), notification.kind.as_str().to_string());

    PushMessage {
        title: notification.title.clone(),
        body: notification.message.clone(),
        data,
    }
}
