//! # taskhub-database
//!
//! PostgreSQL connection management and concrete repository
//! implementations for the delivery engine's storage ports.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
