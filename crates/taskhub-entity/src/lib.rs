//! # taskhub-entity
//!
//! Domain entity models for TaskHub: durable notifications, device
//! registrations, and the task projection consumed by the due-date scanner.

pub mod device;
pub mod notification;
pub mod task;

pub use device::DeviceToken;
pub use notification::{NewNotification, Notification, NotificationKind};
pub use task::{Task, TaskStatus};
