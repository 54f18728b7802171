//! Room system: named fan-out groups and their registry.

pub mod registry;
pub mod room;

pub use registry::RoomRegistry;

use taskhub_core::types::id::{TenantId, UserId};

/// Name of a user's personal room.
pub fn user_room(user_id: UserId) -> String {
    format!("user:{user_id}")
}

/// Name of a tenant's shared room.
pub fn tenant_room(tenant_id: TenantId) -> String {
    format!("tenant:{tenant_id}")
}
