//! Device token repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use taskhub_core::error::{AppError, ErrorKind};
use taskhub_core::result::AppResult;
use taskhub_core::types::id::UserId;
use taskhub_delivery::ports::DeviceRegistry;
use taskhub_entity::DeviceToken;

/// Repository for per-user push device tokens.
#[derive(Debug, Clone)]
pub struct DeviceTokenRepository {
    pool: PgPool,
}

impl DeviceTokenRepository {
    /// Create a new device token repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRegistry for DeviceTokenRepository {
    async fn add_token(&self, user_id: UserId, token: &str) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO device_tokens (user_id, token) VALUES ($1, $2) \
             ON CONFLICT (user_id, token) DO NOTHING",
        )
        .bind(user_id.into_uuid())
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to register device token", e))?;
        Ok(())
    }

    async fn remove_tokens(&self, user_id: UserId, tokens: &[String]) -> AppResult<()> {
        sqlx::query("DELETE FROM device_tokens WHERE user_id = $1 AND token = ANY($2)")
            .bind(user_id.into_uuid())
            .bind(tokens)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to remove device tokens", e)
            })?;
        Ok(())
    }

    async fn tokens_for(&self, user_id: UserId) -> AppResult<Vec<String>> {
        let devices = sqlx::query_as::<_, DeviceToken>(
            "SELECT user_id, token, created_at FROM device_tokens \
             WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list device tokens", e)
        })?;
        Ok(devices.into_iter().map(|d| d.token).collect())
    }
}
