//! # taskhub-push
//!
//! FCM-compatible push gateway client. Implements the delivery engine's
//! [`PushGateway`] port over the legacy multicast HTTP endpoint.
//!
//! [`PushGateway`]: taskhub_delivery::ports::PushGateway

pub mod client;

pub use client::FcmClient;
