//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, mpsc};
use uuid::Uuid;

use taskhub_core::types::id::{TenantId, UserId};

/// Unique connection identifier.
pub type ConnectionId = Uuid;

/// A handle to a single authenticated WebSocket connection.
///
/// Holds the sender side of the outbound frame channel plus the identity
/// established during the handshake. Handles exist only for authenticated
/// connections; a socket that has not completed the handshake is not in
/// the pool and belongs to no room.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// User who owns this connection.
    pub user_id: UserId,
    /// Tenant the user belongs to.
    pub tenant_id: TenantId,
    /// Sender for serialized outbound frames.
    pub sender: mpsc::Sender<String>,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    /// Whether the connection is still alive.
    alive: AtomicBool,
    /// Wakes the socket task when the manager closes this connection.
    closed: Notify,
}

impl ConnectionHandle {
    /// Create a new connection handle.
    pub fn new(user_id: UserId, tenant_id: TenantId, sender: mpsc::Sender<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            tenant_id,
            sender,
            connected_at: Utc::now(),
            alive: AtomicBool::new(true),
            closed: Notify::new(),
        }
    }

    /// Send a serialized frame to this connection without blocking.
    ///
    /// A full buffer drops the frame; a closed channel marks the
    /// connection dead. Returns whether the frame was accepted.
    pub fn send(&self, frame: String) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Check if the connection is alive.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the connection as dead.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Close the connection: mark it dead and wake the socket task so it
    /// tears the transport down. Used on eviction and shutdown.
    pub fn close(&self) {
        self.mark_dead();
        self.closed.notify_one();
    }

    /// Resolves once [`close`](Self::close) has been called. The socket
    /// task selects on this alongside its frame channels.
    pub async fn wait_closed(&self) {
        if !self.is_alive() {
            return;
        }
        // notify_one stores a permit, so a close racing this await still
        // resolves it.
        self.closed.notified().await;
    }
}
