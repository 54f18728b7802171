//! Connection pool keyed by connection and by user.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe pool of all active WebSocket connections.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// User ID to connection handles; one user can hold several sessions.
    by_user: DashMap<Uuid, Vec<Arc<ConnectionHandle>>>,
    /// Connection ID to handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the pool.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, handle.clone());
        self.by_user
            .entry(handle.user_id.into_uuid())
            .or_default()
            .push(handle);
    }

    /// Removes a connection from the pool.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        if let Some(mut connections) = self.by_user.get_mut(&handle.user_id.into_uuid()) {
            connections.retain(|c| c.id != *conn_id);
            if connections.is_empty() {
                drop(connections);
                self.by_user.remove(&handle.user_id.into_uuid());
            }
        }
        Some(handle)
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Gets all connections for a user.
    pub fn user_connections(&self, user_id: &Uuid) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Returns all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns total number of active connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns number of unique connected users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhub_core::types::id::{TenantId, UserId};
    use tokio::sync::mpsc;

    fn handle_for(user_id: UserId) -> Arc<ConnectionHandle> {
        let (tx, _rx) = mpsc::channel(8);
        // Receiver dropped; these tests never send.
        Arc::new(ConnectionHandle::new(user_id, TenantId::new(), tx))
    }

    #[test]
    fn one_user_can_hold_several_connections() {
        let pool = ConnectionPool::new();
        let user = UserId::new();
        pool.add(handle_for(user));
        pool.add(handle_for(user));

        assert_eq!(pool.connection_count(), 2);
        assert_eq!(pool.user_count(), 1);
        assert_eq!(pool.user_connections(&user.into_uuid()).len(), 2);
    }

    #[test]
    fn removing_the_last_connection_clears_the_user_entry() {
        let pool = ConnectionPool::new();
        let user = UserId::new();
        let handle = handle_for(user);
        pool.add(handle.clone());

        assert!(pool.remove(&handle.id).is_some());
        assert_eq!(pool.user_count(), 0);
        assert!(pool.user_connections(&user.into_uuid()).is_empty());
    }

    #[test]
    fn removing_an_unknown_connection_is_a_no_op() {
        let pool = ConnectionPool::new();
        assert!(pool.remove(&Uuid::new_v4()).is_none());
    }
}
