//! Concrete repository implementations of the delivery storage ports.

pub mod device_token;
pub mod notification;
pub mod task;
pub mod tenant;

pub use device_token::DeviceTokenRepository;
pub use notification::NotificationRepository;
pub use task::TaskRepository;
pub use tenant::TenantRepository;
