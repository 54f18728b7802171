//! Due-date scanner: synthesizes `task_due_soon` / `task_overdue` events.
//!
//! Runs on the worker's hourly schedule (plus once at startup) and is also
//! invoked for a single task right after a due-date-changing mutation, so
//! the transition is caught without waiting for the next tick.
//!
//! Thresholds are computed in the tenant's configured calendar frame. A
//! per-day cooldown keyed on (task, kind, calendar day) is inferred from
//! the Notification Store, so an open task reminds at most once per day
//! per subtype rather than on every hourly run.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use taskhub_core::AppResult;
use taskhub_core::types::id::{TaskId, TenantId, UserId};
use taskhub_entity::notification::NotificationKind;
use taskhub_entity::task::Task;

use crate::dispatcher::DeliveryDispatcher;
use crate::event::NotificationEvent;
use crate::ports::{NotificationStore, TaskSource};

/// Hours ahead that still count as "due soon".
const DUE_SOON_MAX_HOURS: i64 = 24;

/// Aggregate result of one scan run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Overdue events emitted.
    pub overdue: usize,
    /// Due-soon events emitted.
    pub due_soon: usize,
    /// Tasks whose notification attempt failed (isolated, logged).
    pub failed: usize,
}

/// Recurring sweep over open tasks with due dates.
pub struct DueDateScanner {
    tasks: Arc<dyn TaskSource>,
    store: Arc<dyn NotificationStore>,
    dispatcher: Arc<DeliveryDispatcher>,
    calendar: Tz,
}

impl DueDateScanner {
    /// Create a scanner over the given task source and dispatcher.
    pub fn new(
        tasks: Arc<dyn TaskSource>,
        store: Arc<dyn NotificationStore>,
        dispatcher: Arc<DeliveryDispatcher>,
        calendar: Tz,
    ) -> Self {
        Self {
            tasks,
            store,
            dispatcher,
            calendar,
        }
    }

    /// Run a full scan over all open tasks with due dates.
    ///
    /// A failure notifying one task never aborts the rest; the report
    /// carries aggregate counts and failures are logged individually.
    pub async fn run(&self) -> AppResult<ScanReport> {
        let tasks = self.tasks.open_tasks_with_due_dates().await?;
        let now = Utc::now();

        let mut report = ScanReport::default();
        for task in &tasks {
            match self.check_task(task, now).await {
                Ok(Some(NotificationKind::TaskOverdue)) => report.overdue += 1,
                Ok(Some(NotificationKind::TaskDueSoon)) => report.due_soon += 1,
                Ok(_) => {}
                Err(e) => {
                    report.failed += 1;
                    warn!(task_id = %task.id, error = %e, "Due-date notification failed for task");
                }
            }
        }

        info!(
            scanned = tasks.len(),
            overdue = report.overdue,
            due_soon = report.due_soon,
            failed = report.failed,
            "Due-date scan finished"
        );
        Ok(report)
    }

    /// Check a single task, used immediately after a due-date change.
    pub async fn scan_task(&self, task_id: TaskId) -> AppResult<Option<NotificationKind>> {
        let Some(task) = self.tasks.find_task(task_id).await? else {
            debug!(task_id = %task_id, "Task not found for due-date check");
            return Ok(None);
        };
        self.check_task(&task, Utc::now()).await
    }

    /// Evaluate one task against the overdue and due-soon thresholds,
    /// honoring the per-day cooldown. Returns the kind emitted, if any.
    async fn check_task(
        &self,
        task: &Task,
        now: DateTime<Utc>,
    ) -> AppResult<Option<NotificationKind>> {
        if !task.is_open() {
            return Ok(None);
        }
        let Some(due) = task.due_date else {
            return Ok(None);
        };

        if due < now {
            let days_overdue = (now - due).num_days();
            if self.fired_today(task, NotificationKind::TaskOverdue, now).await? {
                return Ok(None);
            }
            self.emit_overdue(task, due, days_overdue).await?;
            return Ok(Some(NotificationKind::TaskOverdue));
        }

        if due <= self.end_of_tomorrow(now) {
            let hours_until_due = (due - now).num_hours();
            if (0..=DUE_SOON_MAX_HOURS).contains(&hours_until_due) {
                if self.fired_today(task, NotificationKind::TaskDueSoon, now).await? {
                    return Ok(None);
                }
                self.emit_due_soon(task, due, hours_until_due).await?;
                return Ok(Some(NotificationKind::TaskDueSoon));
            }
        }

        Ok(None)
    }

    async fn emit_overdue(&self, task: &Task, due: DateTime<Utc>, days: i64) -> AppResult<()> {
        let mut metadata = HashMap::new();
        metadata.insert("days_overdue".to_string(), days.to_string());
        metadata.insert("due_date".to_string(), due.to_rfc3339());

        self.dispatcher
            .notify(NotificationEvent {
                user_id: UserId::from_uuid(task.assignee_id),
                tenant_id: TenantId::from_uuid(task.tenant_id),
                kind: NotificationKind::TaskOverdue,
                title: "Task overdue".to_string(),
                message: format!("'{}' is overdue by {} day(s)", task.title, days),
                task_id: Some(TaskId::from_uuid(task.id)),
                triggered_by: None,
                metadata,
            })
            .await?;
        Ok(())
    }

    async fn emit_due_soon(&self, task: &Task, due: DateTime<Utc>, hours: i64) -> AppResult<()> {
        let mut metadata = HashMap::new();
        metadata.insert("hours_until_due".to_string(), hours.to_string());
        metadata.insert("due_date".to_string(), due.to_rfc3339());

        self.dispatcher
            .notify(NotificationEvent {
                user_id: UserId::from_uuid(task.assignee_id),
                tenant_id: TenantId::from_uuid(task.tenant_id),
                kind: NotificationKind::TaskDueSoon,
                title: "Task due soon".to_string(),
                message: format!("'{}' is due in {} hour(s)", task.title, hours),
                task_id: Some(TaskId::from_uuid(task.id)),
                triggered_by: None,
                metadata,
            })
            .await?;
        Ok(())
    }

    /// Cooldown probe: has a notification of `kind` for this task already
    /// been stored today (calendar frame) for the assignee?
    async fn fired_today(
        &self,
        task: &Task,
        kind: NotificationKind,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.store
            .exists_since(
                UserId::from_uuid(task.assignee_id),
                TaskId::from_uuid(task.id),
                kind,
                self.start_of_local_day(now),
            )
            .await
    }

    /// Midnight of the current calendar day, converted back to UTC.
    fn start_of_local_day(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local = now.with_timezone(&self.calendar);
        let midnight = local
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap_or_else(|| local.naive_local());
        self.calendar
            .from_local_datetime(&midnight)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now)
    }

    /// Exclusive upper bound of the soon-window: end of tomorrow in the
    /// calendar frame.
    fn end_of_tomorrow(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.start_of_local_day(now) + Duration::days(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        FakeBroadcaster, FakeDeviceRegistry, FakePushGateway, FakeTaskSource, FakeTenantDirectory,
        InMemoryStore, open_task,
    };
    use taskhub_entity::task::TaskStatus;

    fn scanner(
        tasks: Arc<FakeTaskSource>,
        store: Arc<InMemoryStore>,
    ) -> (DueDateScanner, Arc<InMemoryStore>) {
        let dispatcher = Arc::new(DeliveryDispatcher::new(
            Arc::clone(&store) as Arc<dyn NotificationStore>,
            Arc::new(FakeDeviceRegistry::new()),
            Arc::new(FakePushGateway::new()),
            Arc::new(FakeBroadcaster::new()),
            Arc::new(FakeTenantDirectory::new()),
        ));
        let scanner = DueDateScanner::new(
            tasks,
            Arc::clone(&store) as Arc<dyn NotificationStore>,
            dispatcher,
            chrono_tz::Asia::Kolkata,
        );
        (scanner, store)
    }

    #[tokio::test]
    async fn task_due_in_three_hours_emits_one_due_soon() {
        // 3h30m so the floor stays at 3 even after a few ms of test time.
        let due = Utc::now() + Duration::hours(3) + Duration::minutes(30);
        let task = open_task(TaskStatus::Todo, Some(due));
        let tasks = Arc::new(FakeTaskSource::with_tasks(vec![task.clone()]));
        let (scanner, store) = scanner(tasks, Arc::new(InMemoryStore::new()));

        let report = scanner.run().await.unwrap();

        assert_eq!(report.due_soon, 1);
        assert_eq!(report.overdue, 0);
        let records = store.records_for(UserId::from_uuid(task.assignee_id));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, NotificationKind::TaskDueSoon);
        assert_eq!(
            records[0].metadata.0.get("hours_until_due").map(String::as_str),
            Some("3")
        );
    }

    #[tokio::test]
    async fn task_two_days_overdue_emits_one_overdue() {
        let task = open_task(TaskStatus::InProgress, Some(Utc::now() - Duration::days(2)));
        let tasks = Arc::new(FakeTaskSource::with_tasks(vec![task.clone()]));
        let (scanner, store) = scanner(tasks, Arc::new(InMemoryStore::new()));

        let report = scanner.run().await.unwrap();

        assert_eq!(report.overdue, 1);
        assert_eq!(report.due_soon, 0);
        let records = store.records_for(UserId::from_uuid(task.assignee_id));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, NotificationKind::TaskOverdue);
        assert_eq!(
            records[0].metadata.0.get("days_overdue").map(String::as_str),
            Some("2")
        );
    }

    #[tokio::test]
    async fn completed_overdue_task_emits_nothing() {
        let task = open_task(TaskStatus::Completed, Some(Utc::now() - Duration::days(3)));
        let tasks = Arc::new(FakeTaskSource::with_tasks(vec![task.clone()]));
        let (scanner, store) = scanner(tasks, Arc::new(InMemoryStore::new()));

        let report = scanner.run().await.unwrap();

        assert_eq!(report, ScanReport::default());
        assert!(store.records_for(UserId::from_uuid(task.assignee_id)).is_empty());
    }

    #[tokio::test]
    async fn second_run_same_day_is_suppressed_by_cooldown() {
        let task = open_task(TaskStatus::Todo, Some(Utc::now() + Duration::hours(5)));
        let tasks = Arc::new(FakeTaskSource::with_tasks(vec![task.clone()]));
        let (scanner, store) = scanner(tasks, Arc::new(InMemoryStore::new()));

        let first = scanner.run().await.unwrap();
        let second = scanner.run().await.unwrap();

        assert_eq!(first.due_soon, 1);
        assert_eq!(second.due_soon, 0);
        assert_eq!(store.records_for(UserId::from_uuid(task.assignee_id)).len(), 1);
    }

    #[tokio::test]
    async fn task_beyond_the_soon_window_is_ignored() {
        let task = open_task(TaskStatus::Todo, Some(Utc::now() + Duration::hours(60)));
        let tasks = Arc::new(FakeTaskSource::with_tasks(vec![task]));
        let (scanner, _) = scanner(tasks, Arc::new(InMemoryStore::new()));

        let report = scanner.run().await.unwrap();

        assert_eq!(report, ScanReport::default());
    }

    #[tokio::test]
    async fn one_failing_task_does_not_abort_the_rest() {
        let failing = open_task(TaskStatus::Todo, Some(Utc::now() + Duration::hours(2)));
        let healthy = open_task(TaskStatus::Todo, Some(Utc::now() + Duration::hours(4)));
        let tasks = Arc::new(FakeTaskSource::with_tasks(vec![
            failing.clone(),
            healthy.clone(),
        ]));
        let store = Arc::new(InMemoryStore::new());
        store.fail_appends_for(UserId::from_uuid(failing.assignee_id));
        let (scanner, store) = scanner(tasks, store);

        let report = scanner.run().await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.due_soon, 1);
        assert_eq!(
            store.records_for(UserId::from_uuid(healthy.assignee_id)).len(),
            1
        );
    }

    #[tokio::test]
    async fn scan_task_catches_a_fresh_due_date() {
        let task = open_task(TaskStatus::Todo, Some(Utc::now() + Duration::hours(1)));
        let tasks = Arc::new(FakeTaskSource::with_tasks(vec![task.clone()]));
        let (scanner, store) = scanner(tasks, Arc::new(InMemoryStore::new()));

        let emitted = scanner.scan_task(TaskId::from_uuid(task.id)).await.unwrap();

        assert_eq!(emitted, Some(NotificationKind::TaskDueSoon));
        assert_eq!(store.records_for(UserId::from_uuid(task.assignee_id)).len(), 1);
    }

    #[tokio::test]
    async fn scan_task_for_unknown_id_is_a_no_op() {
        let tasks = Arc::new(FakeTaskSource::with_tasks(Vec::new()));
        let (scanner, _) = scanner(tasks, Arc::new(InMemoryStore::new()));

        let emitted = scanner.scan_task(TaskId::new()).await.unwrap();

        assert_eq!(emitted, None);
    }
}
