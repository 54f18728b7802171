//! # taskhub-delivery
//!
//! The notification delivery domain for TaskHub:
//!
//! - [`event::NotificationEvent`]: the single event descriptor business
//!   operations submit for delivery
//! - [`ports`]: the traits the engine is wired against (store, device
//!   registry, push gateway, live broadcaster, tenant directory, task source)
//! - [`dispatcher::DeliveryDispatcher`]: persists, broadcasts, and fans
//!   push delivery out, each step with its own failure boundary
//! - [`scanner::DueDateScanner`]: synthesizes due-soon/overdue events on a
//!   recurring sweep with a per-day cooldown
//!
//! The crate depends only on `taskhub-core` and `taskhub-entity`; every
//! port has in-memory fakes in the test support module, so the dispatcher
//! and scanner are tested without a database or network.

pub mod dispatcher;
pub mod event;
pub mod ports;
pub mod scanner;

#[cfg(test)]
pub(crate) mod test_support;

pub use dispatcher::DeliveryDispatcher;
pub use event::NotificationEvent;
pub use scanner::{DueDateScanner, ScanReport};
