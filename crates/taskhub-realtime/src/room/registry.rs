//! Room registry. Rooms appear on first join and vanish with their last
//! member, so the map never accumulates empty entries.

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

use super::room::Room;

/// Registry of all active rooms.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Room name to room.
    rooms: DashMap<String, Room>,
}

impl RoomRegistry {
    /// Creates a new room registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to a room, creating the room if needed.
    pub fn join(&self, room_name: String, conn_id: ConnectionId) {
        self.rooms
            .entry(room_name.clone())
            .or_insert_with(|| Room::new(room_name))
            .join(conn_id);
    }

    /// Removes a connection from a room, dropping the room when empty.
    pub fn leave(&self, room_name: &str, conn_id: ConnectionId) {
        if let Some(mut room) = self.rooms.get_mut(room_name) {
            room.leave(conn_id);
            if room.is_empty() {
                drop(room);
                self.rooms.remove(room_name);
            }
        }
    }

    /// Returns all member connection IDs for a room.
    pub fn members(&self, room_name: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room_name)
            .map(|room| room.member_ids())
            .unwrap_or_default()
    }

    /// Returns member count for a room.
    pub fn member_count(&self, room_name: &str) -> usize {
        self.rooms
            .get(room_name)
            .map(|room| room.member_count())
            .unwrap_or(0)
    }

    /// Returns total number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn join_creates_the_room_on_demand() {
        let registry = RoomRegistry::new();
        let conn = Uuid::new_v4();

        registry.join("user:abc".to_string(), conn);

        assert_eq!(registry.room_count(), 1);
        assert_eq!(registry.members("user:abc"), vec![conn]);
    }

    #[test]
    fn last_leave_removes_the_room() {
        let registry = RoomRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        registry.join("tenant:t".to_string(), a);
        registry.join("tenant:t".to_string(), b);

        registry.leave("tenant:t", a);
        assert_eq!(registry.member_count("tenant:t"), 1);

        registry.leave("tenant:t", b);
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn leaving_an_unknown_room_is_a_no_op() {
        let registry = RoomRegistry::new();
        registry.leave("user:missing", Uuid::new_v4());
        assert_eq!(registry.room_count(), 0);
    }
}
