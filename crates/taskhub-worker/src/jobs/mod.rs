//! Built-in scheduled job implementations.

pub mod cleanup;
pub mod due_date;
