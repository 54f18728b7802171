//! Inbound and outbound WebSocket message type definitions.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use taskhub_entity::notification::Notification;

/// Accepts a single ID or an array of IDs, normalized to a vec.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Uuid),
        Many(Vec<Uuid>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(id) => vec![id],
        OneOrMany::Many(ids) => ids,
    })
}

/// Messages sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First-message handshake carrying the access token.
    Authenticate {
        /// JWT access token.
        token: String,
    },
    /// Mark the given notifications as read. Accepts `ids` as a single
    /// ID or an array, and `id` as an alias.
    MarkRead {
        /// Notification IDs to mark.
        #[serde(alias = "id", deserialize_with = "one_or_many")]
        ids: Vec<Uuid>,
    },
    /// Mark all of the user's notifications as read.
    MarkAllRead,
    /// Request an unread sync (count plus recent unread items).
    GetUnread,
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake accepted.
    Authenticated {
        /// Authenticated user.
        user_id: Uuid,
        /// The user's tenant.
        tenant_id: Uuid,
        /// Current unread count.
        unread_count: i64,
    },
    /// Handshake rejected; the socket stays open for another attempt
    /// until the handshake deadline.
    AuthError {
        /// Rejection reason.
        message: String,
    },
    /// Live delivery of a notification record.
    Notification {
        /// The persisted record, exactly as stored.
        notification: Notification,
    },
    /// Unread sync response.
    UnreadNotifications {
        /// Total unread count (may exceed the item list length).
        count: i64,
        /// Most recent unread records, newest first.
        items: Vec<Notification>,
    },
    /// Acknowledgement of a mark-read request.
    NotificationsMarkedRead {
        /// Rows actually transitioned.
        count: u64,
        /// The requested IDs, echoed back.
        ids: Vec<Uuid>,
    },
    /// Acknowledgement of a mark-all-read request.
    AllNotificationsMarkedRead {
        /// Rows actually transitioned.
        count: u64,
    },
    /// Error frame for a failed in-session request.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_parse_from_tagged_json() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"authenticate","token":"abc"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Authenticate { token } if token == "abc"));

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"mark_all_read"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::MarkAllRead));
    }

    #[test]
    fn mark_read_accepts_a_single_id_or_a_batch() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let single = format!(r#"{{"type":"mark_read","id":"{a}"}}"#);
        let msg: ClientMessage = serde_json::from_str(&single).unwrap();
        assert!(matches!(msg, ClientMessage::MarkRead { ids } if ids == vec![a]));

        let single_under_ids = format!(r#"{{"type":"mark_read","ids":"{a}"}}"#);
        let msg: ClientMessage = serde_json::from_str(&single_under_ids).unwrap();
        assert!(matches!(msg, ClientMessage::MarkRead { ids } if ids == vec![a]));

        let batch = format!(r#"{{"type":"mark_read","ids":["{a}","{b}"]}}"#);
        let msg: ClientMessage = serde_json::from_str(&batch).unwrap();
        assert!(matches!(msg, ClientMessage::MarkRead { ids } if ids == vec![a, b]));
    }

    #[test]
    fn server_messages_serialize_with_a_type_tag() {
        let frame = serde_json::to_value(ServerMessage::AllNotificationsMarkedRead { count: 3 })
            .unwrap();
        assert_eq!(frame["type"], "all_notifications_marked_read");
        assert_eq!(frame["count"], 3);
    }
}
