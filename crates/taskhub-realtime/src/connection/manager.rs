//! Connection manager: lifecycle, in-session requests, and room fan-out.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use taskhub_core::config::RealtimeConfig;
use taskhub_core::result::AppResult;
use taskhub_core::types::id::{TenantId, UserId};
use taskhub_core::types::pagination::PageRequest;
use taskhub_delivery::ports::{LiveBroadcaster, NotificationFilter, NotificationStore};
use taskhub_entity::notification::Notification;

use crate::message::types::{ClientMessage, ServerMessage};
use crate::room::registry::RoomRegistry;
use crate::room::{tenant_room, user_room};

use super::authenticator::AuthenticatedConnection;
use super::handle::{ConnectionHandle, ConnectionId};
use super::pool::ConnectionPool;

/// Manages all active WebSocket connections.
///
/// Every registered connection is a member of exactly two rooms: its
/// user's personal room and its tenant's shared room.
pub struct ConnectionManager {
    /// Connection pool.
    pool: Arc<ConnectionPool>,
    /// Room registry.
    rooms: Arc<RoomRegistry>,
    /// Durable store backing in-session read-state requests.
    store: Arc<dyn NotificationStore>,
    /// Configuration.
    config: RealtimeConfig,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("pool", &self.pool)
            .field("rooms", &self.rooms)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(config: RealtimeConfig, store: Arc<dyn NotificationStore>) -> Self {
        Self {
            pool: Arc::new(ConnectionPool::new()),
            rooms: Arc::new(RoomRegistry::new()),
            store,
            config,
        }
    }

    /// Registers a freshly authenticated connection.
    ///
    /// Returns the handle and the receiver end of its outbound frame
    /// channel. When the user is at their connection cap, the oldest
    /// connection is evicted.
    pub fn register(
        &self,
        identity: AuthenticatedConnection,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(
            identity.user_id,
            identity.tenant_id,
            tx,
        ));

        let existing = self.pool.user_connections(&identity.user_id.into_uuid());
        if existing.len() >= self.config.max_connections_per_user {
            warn!(
                user_id = %identity.user_id,
                count = existing.len(),
                max = self.config.max_connections_per_user,
                "User at max connections, evicting oldest"
            );
            if let Some(oldest) = existing.first() {
                // Tell the evicted session why before the close lands.
                self.reply_error(
                    oldest,
                    "SESSION_REPLACED",
                    "Connection limit reached; this session was replaced by a newer one",
                );
                self.unregister(&oldest.id);
            }
        }

        self.pool.add(handle.clone());
        self.rooms.join(user_room(handle.user_id), handle.id);
        self.rooms.join(tenant_room(handle.tenant_id), handle.id);

        info!(
            conn_id = %handle.id,
            user_id = %handle.user_id,
            tenant_id = %handle.tenant_id,
            "WebSocket connection registered"
        );

        (handle, rx)
    }

    /// Unregisters a connection and leaves its rooms. Closing the handle
    /// wakes its socket task, which tears the transport down.
    pub fn unregister(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.pool.remove(conn_id) {
            handle.close();
            self.rooms.leave(&user_room(handle.user_id), *conn_id);
            self.rooms.leave(&tenant_room(handle.tenant_id), *conn_id);

            info!(
                conn_id = %conn_id,
                user_id = %handle.user_id,
                "WebSocket connection unregistered"
            );
        }
    }

    /// Current unread count for a user.
    pub async fn unread_count(&self, user_id: UserId) -> AppResult<i64> {
        self.store.count_unread(user_id).await
    }

    /// Processes an inbound frame from an authenticated connection.
    pub async fn handle_message(&self, conn_id: &ConnectionId, raw: &str) {
        let Some(handle) = self.pool.get(conn_id) else {
            warn!(conn_id = %conn_id, "Frame from unknown connection");
            return;
        };

        let msg: ClientMessage = match serde_json::from_str(raw) {
            Ok(m) => m,
            Err(e) => {
                self.reply(
                    &handle,
                    &ServerMessage::Error {
                        code: "INVALID_MESSAGE".to_string(),
                        message: format!("Failed to parse message: {e}"),
                    },
                );
                return;
            }
        };

        match msg {
            ClientMessage::Authenticate { .. } => {
                self.reply(
                    &handle,
                    &ServerMessage::Error {
                        code: "ALREADY_AUTHENTICATED".to_string(),
                        message: "Connection is already authenticated".to_string(),
                    },
                );
            }
            ClientMessage::MarkRead { ids } => match self.store.mark_read(handle.user_id, &ids).await {
                Ok(count) => {
                    debug!(conn_id = %conn_id, count, "Notifications marked read");
                    self.reply(
                        &handle,
                        &ServerMessage::NotificationsMarkedRead { count, ids },
                    );
                }
                Err(e) => self.reply_error(&handle, "MARK_READ_FAILED", &e.to_string()),
            },
            ClientMessage::MarkAllRead => match self.store.mark_all_read(handle.user_id).await {
                Ok(count) => {
                    debug!(conn_id = %conn_id, count, "All notifications marked read");
                    self.reply(&handle, &ServerMessage::AllNotificationsMarkedRead { count });
                }
                Err(e) => self.reply_error(&handle, "MARK_ALL_READ_FAILED", &e.to_string()),
            },
            ClientMessage::GetUnread => match self.unread_sync(handle.user_id).await {
                Ok(frame) => self.reply(&handle, &frame),
                Err(e) => self.reply_error(&handle, "UNREAD_SYNC_FAILED", &e.to_string()),
            },
        }
    }

    /// Builds the unread sync frame: total count plus the most recent
    /// unread records up to the configured limit.
    async fn unread_sync(&self, user_id: UserId) -> AppResult<ServerMessage> {
        let count = self.store.count_unread(user_id).await?;
        let filter = NotificationFilter {
            is_read: Some(false),
            kind: None,
        };
        let page = PageRequest::new(1, self.config.unread_sync_limit);
        let unread = self.store.list_by_user(user_id, &filter, &page).await?;

        Ok(ServerMessage::UnreadNotifications {
            count,
            items: unread.items,
        })
    }

    fn reply(&self, handle: &ConnectionHandle, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(frame) => {
                handle.send(frame);
            }
            Err(e) => warn!(conn_id = %handle.id, error = %e, "Failed to serialize reply"),
        }
    }

    fn reply_error(&self, handle: &ConnectionHandle, code: &str, message: &str) {
        self.reply(
            handle,
            &ServerMessage::Error {
                code: code.to_string(),
                message: message.to_string(),
            },
        );
    }

    /// Sends a serialized frame to every member of a room.
    fn send_to_room(&self, room_name: &str, frame: &str) -> usize {
        let mut sent = 0;
        for conn_id in self.rooms.members(room_name) {
            if let Some(handle) = self.pool.get(&conn_id) {
                if handle.send(frame.to_string()) {
                    sent += 1;
                }
            }
        }
        sent
    }

    /// Closes all connections, for graceful shutdown.
    pub fn close_all(&self) {
        let all = self.pool.all_connections();
        for conn in &all {
            self.unregister(&conn.id);
        }
        info!(count = all.len(), "All connections closed");
    }

    /// Returns the total connection count.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Checks if a user has at least one live session.
    pub fn is_user_connected(&self, user_id: &Uuid) -> bool {
        !self.pool.user_connections(user_id).is_empty()
    }
}

#[async_trait]
impl LiveBroadcaster for ConnectionManager {
    async fn broadcast_to_user(
        &self,
        user_id: UserId,
        notification: &Notification,
    ) -> AppResult<()> {
        let frame = serde_json::to_string(&ServerMessage::Notification {
            notification: notification.clone(),
        })?;
        let sent = self.send_to_room(&user_room(user_id), &frame);
        debug!(user_id = %user_id, sessions = sent, "User broadcast");
        Ok(())
    }

    async fn broadcast_to_tenant(
        &self,
        tenant_id: TenantId,
        notification: &Notification,
    ) -> AppResult<()> {
        let frame = serde_json::to_string(&ServerMessage::Notification {
            notification: notification.clone(),
        })?;
        let sent = self.send_to_room(&tenant_room(tenant_id), &frame);
        debug!(tenant_id = %tenant_id, sessions = sent, "Tenant broadcast");
        Ok(())
    }
}
