//! Device token entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A push-reachable device endpoint registered by a user.
///
/// Tokens form a set per user: registering the same token twice is a
/// no-op, and a token is removed only when the push gateway reports it
/// permanently invalid.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeviceToken {
    /// Owning user.
    pub user_id: Uuid,
    /// Opaque push-endpoint token.
    pub token: String,
    /// When the token was first registered.
    pub created_at: DateTime<Utc>,
}
