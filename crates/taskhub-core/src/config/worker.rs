//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the scheduler is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression for the nightly notification reaper.
    #[serde(default = "default_reaper_schedule")]
    pub reaper_schedule: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reaper_schedule: default_reaper_schedule(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_reaper_schedule() -> String {
    // Daily at 2 AM.
    "0 0 2 * * *".to_string()
}
