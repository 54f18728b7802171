//! # taskhub-worker
//!
//! Scheduled background tasks:
//!
//! - the recurring due-date scan (hourly by default, plus once at start)
//! - the nightly retention reaper that purges expired notifications

pub mod jobs;
pub mod scheduler;

pub use scheduler::CronScheduler;
