//! Notification retention reaper.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info};

use taskhub_delivery::ports::NotificationStore;

/// Purge notification records older than the retention window.
pub async fn run_retention_reaper(store: Arc<dyn NotificationStore>, retention_days: i64) {
    let cutoff = Utc::now() - Duration::days(retention_days);
    match store.purge_expired(cutoff).await {
        Ok(purged) => info!(purged, retention_days, "Notification reaper completed"),
        Err(e) => error!(error = %e, "Notification reaper failed"),
    }
}
