//! Device registration entity.

pub mod model;

pub use model::DeviceToken;
