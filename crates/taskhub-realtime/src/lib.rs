//! # taskhub-realtime
//!
//! Real-time WebSocket engine for TaskHub. Provides:
//!
//! - WebSocket connection management with a first-message JWT handshake
//! - Per-user (`user:{id}`) and per-tenant (`tenant:{id}`) rooms
//! - Live notification fan-out implementing the delivery engine's
//!   [`LiveBroadcaster`] port
//! - In-session read-state operations (mark read, mark all read, unread
//!   sync) against the notification store
//!
//! Sends to a connection never block: a full outbound buffer drops the
//! frame and a closed one marks the connection dead. The durable store
//! remains the source of truth for anything a live session misses.
//!
//! [`LiveBroadcaster`]: taskhub_delivery::ports::LiveBroadcaster

pub mod connection;
pub mod message;
pub mod room;
pub mod server;

pub use connection::authenticator::WsAuthenticator;
pub use connection::manager::ConnectionManager;
pub use room::registry::RoomRegistry;
pub use server::RealtimeServer;
