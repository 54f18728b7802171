//! Recurring due-date scan job.

use std::sync::Arc;

use tracing::{error, info};

use taskhub_delivery::DueDateScanner;

/// Run one full due-date scan. Errors are logged, never propagated; the
/// next tick starts from scratch regardless of this run's outcome.
pub async fn run_due_date_scan(scanner: Arc<DueDateScanner>) {
    match scanner.run().await {
        Ok(report) => info!(
            overdue = report.overdue,
            due_soon = report.due_soon,
            failed = report.failed,
            "Due-date scan job completed"
        ),
        Err(e) => error!(error = %e, "Due-date scan job failed"),
    }
}
