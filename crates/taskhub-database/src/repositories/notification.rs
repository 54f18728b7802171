//! Notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use taskhub_core::error::{AppError, ErrorKind};
use taskhub_core::result::AppResult;
use taskhub_core::types::id::{TaskId, UserId};
use taskhub_core::types::pagination::{PageRequest, PageResponse};
use taskhub_delivery::ports::{NotificationFilter, NotificationStore};
use taskhub_entity::notification::{NewNotification, Notification, NotificationKind};

/// Repository for durable notification records.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn append(&self, record: NewNotification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (user_id, tenant_id, kind, title, message, task_id, triggered_by, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(record.user_id)
        .bind(record.tenant_id)
        .bind(record.kind)
        .bind(&record.title)
        .bind(&record.message)
        .bind(record.task_id)
        .bind(record.triggered_by)
        .bind(Json(record.metadata))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        // Both filter fields are bound whether or not they are set; a NULL
        // bind disables its clause.
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE user_id = $1 AND ($2::boolean IS NULL OR is_read = $2) \
               AND ($3::notification_kind IS NULL OR kind = $3)",
        )
        .bind(user_id.into_uuid())
        .bind(filter.is_read)
        .bind(filter.kind)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count notifications", e))?;

        let notifs = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE user_id = $1 AND ($2::boolean IS NULL OR is_read = $2) \
               AND ($3::notification_kind IS NULL OR kind = $3) \
             ORDER BY created_at DESC LIMIT $4 OFFSET $5",
        )
        .bind(user_id.into_uuid())
        .bind(filter.is_read)
        .bind(filter.kind)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notifications", e))?;

        Ok(PageResponse::new(
            notifs,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn count_unread(&self, user_id: UserId) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id.into_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count unread", e))
    }

    async fn mark_read(&self, user_id: UserId, ids: &[Uuid]) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, updated_at = NOW() \
             WHERE user_id = $1 AND id = ANY($2) AND is_read = FALSE",
        )
        .bind(user_id.into_uuid())
        .bind(ids)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark read", e))?;
        Ok(result.rows_affected())
    }

    async fn mark_all_read(&self, user_id: UserId) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, updated_at = NOW() \
             WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id.into_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark all read", e))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, user_id: UserId, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1 AND id = $2")
            .bind(user_id.into_uuid())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete notification", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_read(&self, user_id: UserId) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE user_id = $1 AND is_read = TRUE")
                .bind(user_id.into_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Database,
                        "Failed to delete read notifications",
                        e,
                    )
                })?;
        Ok(result.rows_affected())
    }

    async fn exists_since(
        &self,
        user_id: UserId,
        task_id: TaskId,
        kind: NotificationKind,
        since: DateTime<Utc>,
    ) -> AppResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(\
                SELECT 1 FROM notifications \
                WHERE user_id = $1 AND task_id = $2 AND kind = $3 AND created_at >= $4\
             )",
        )
        .bind(user_id.into_uuid())
        .bind(task_id.into_uuid())
        .bind(kind)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to probe recent notifications", e)
        })
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to purge expired notifications", e)
            })?;
        Ok(result.rows_affected())
    }
}
