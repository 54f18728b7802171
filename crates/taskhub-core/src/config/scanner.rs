//! Due-date scanner configuration.

use serde::{Deserialize, Serialize};

/// Due-date scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Cron expression for the recurring scan (6-field, seconds first).
    #[serde(default = "default_schedule")]
    pub schedule: String,
    /// Whether to run a scan immediately at process start.
    #[serde(default = "default_true")]
    pub run_on_start: bool,
    /// Calendar frame used for day boundaries and the per-day cooldown.
    #[serde(default = "default_timezone")]
    pub calendar_timezone: chrono_tz::Tz,
    /// Days a notification record is retained before the reaper purges it.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            schedule: default_schedule(),
            run_on_start: true,
            calendar_timezone: default_timezone(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_schedule() -> String {
    // Top of every hour.
    "0 0 * * * *".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timezone() -> chrono_tz::Tz {
    chrono_tz::Asia::Kolkata
}

fn default_retention_days() -> i64 {
    90
}
