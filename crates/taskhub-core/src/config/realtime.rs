//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Bind address for the WebSocket listener.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Outbound buffer size per connection. A full buffer drops frames
    /// rather than blocking the sender.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Maximum WebSocket connections per user.
    #[serde(default = "default_max_connections_per_user")]
    pub max_connections_per_user: usize,
    /// Maximum unread items returned in a single `unread_notifications`
    /// sync frame.
    #[serde(default = "default_unread_sync_limit")]
    pub unread_sync_limit: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            channel_buffer_size: default_channel_buffer(),
            max_connections_per_user: default_max_connections_per_user(),
            unread_sync_limit: default_unread_sync_limit(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8090".to_string()
}

fn default_channel_buffer() -> usize {
    256
}

fn default_max_connections_per_user() -> usize {
    5
}

fn default_unread_sync_limit() -> u64 {
    50
}
