//! Connection lifecycle: handles, pool, authentication, and management.

pub mod authenticator;
pub mod handle;
pub mod manager;
pub mod pool;
