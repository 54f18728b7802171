//! Push gateway configuration.

use serde::{Deserialize, Serialize};

/// Push notification gateway settings.
///
/// When `server_key` is empty the gateway reports itself unavailable and
/// push delivery is skipped; the rest of the delivery pipeline is unaffected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Multicast endpoint URL of the push gateway.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Server credential presented to the gateway.
    #[serde(default)]
    pub server_key: String,
    /// Per-request timeout in seconds. A timeout is a transient failure.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            server_key: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    "https://fcm.googleapis.com/fcm/send".to_string()
}

fn default_timeout() -> u64 {
    10
}
