//! Tenant membership repository for tenant-wide delivery.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use taskhub_core::error::{AppError, ErrorKind};
use taskhub_core::result::AppResult;
use taskhub_core::types::id::{TenantId, UserId};
use taskhub_delivery::ports::TenantDirectory;

/// Repository over the tenant membership table.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    /// Create a new tenant repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantDirectory for TenantRepository {
    async fn user_ids_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<UserId>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT user_id FROM tenant_members WHERE tenant_id = $1")
                .bind(tenant_id.into_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to list tenant members", e)
                })?;
        Ok(ids.into_iter().map(UserId::from_uuid).collect())
    }
}
