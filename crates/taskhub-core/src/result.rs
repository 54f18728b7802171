//! Application result alias.

use crate::error::AppError;

/// Shorthand result type used across all TaskHub crates.
pub type AppResult<T> = Result<T, AppError>;
