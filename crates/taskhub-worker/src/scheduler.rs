//! Cron scheduler for the recurring background tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::info;

use taskhub_core::config::{ScannerConfig, WorkerConfig};
use taskhub_core::error::AppError;
use taskhub_delivery::DueDateScanner;
use taskhub_delivery::ports::NotificationStore;

use crate::jobs::{cleanup, due_date};

/// Cron-based scheduler driving the due-date scan and the retention
/// reaper.
pub struct CronScheduler {
    /// The underlying job scheduler.
    scheduler: JobScheduler,
    scanner: Arc<DueDateScanner>,
    store: Arc<dyn NotificationStore>,
    scanner_config: ScannerConfig,
    worker_config: WorkerConfig,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new(
        scanner_config: ScannerConfig,
        worker_config: WorkerConfig,
        scanner: Arc<DueDateScanner>,
        store: Arc<dyn NotificationStore>,
    ) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            scanner,
            store,
            scanner_config,
            worker_config,
        })
    }

    /// Register all scheduled tasks.
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        self.register_due_date_scan().await?;
        self.register_retention_reaper().await?;

        info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler, running an immediate scan first when
    /// configured to catch transitions that happened while down.
    pub async fn start(&self) -> Result<(), AppError> {
        if self.scanner_config.run_on_start {
            info!("Running startup due-date scan");
            due_date::run_due_date_scan(Arc::clone(&self.scanner)).await;
        }

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        info!("Cron scheduler shut down");
        Ok(())
    }

    async fn register_due_date_scan(&self) -> Result<(), AppError> {
        let scanner = Arc::clone(&self.scanner);
        let job = CronJob::new_async(self.scanner_config.schedule.as_str(), move |_uuid, _lock| {
            let scanner = Arc::clone(&scanner);
            Box::pin(async move {
                due_date::run_due_date_scan(scanner).await;
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create due-date schedule: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add due-date schedule: {e}")))?;

        info!(schedule = %self.scanner_config.schedule, "Registered: due_date_scan");
        Ok(())
    }

    async fn register_retention_reaper(&self) -> Result<(), AppError> {
        let store = Arc::clone(&self.store);
        let retention_days = self.scanner_config.retention_days;
        let job = CronJob::new_async(
            self.worker_config.reaper_schedule.as_str(),
            move |_uuid, _lock| {
                let store = Arc::clone(&store);
                Box::pin(async move {
                    cleanup::run_retention_reaper(store, retention_days).await;
                })
            },
        )
        .map_err(|e| AppError::internal(format!("Failed to create reaper schedule: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add reaper schedule: {e}")))?;

        info!(
            schedule = %self.worker_config.reaper_schedule,
            retention_days,
            "Registered: notification_reaper"
        );
        Ok(())
    }
}
