use async_trait::async_trait;
use sqlx::PgPool;

use scopegate_application::{AccessAuditEntry, AuditEvent, AuditRepository};
use scopegate_core::{AppError, AppResult};

/// PostgreSQL-backed append-only audit repository.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log_entries (
                tenant_id,
                subject,
                action,
                resource_type,
                resource_id,
                detail
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.tenant_id.as_uuid())
        .bind(event.subject)
        .bind(event.action.as_str())
        .bind(event.resource_type)
        .bind(event.resource_id)
        .bind(event.detail)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit event: {error}")))?;

        Ok(())
    }

    async fn append_access_entry(&self, entry: AccessAuditEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO access_audit_log (
                user_id,
                tenant_id,
                resource,
                action,
                resource_id,
                result,
                reason,
                ip_address,
                user_agent,
                context,
                occurred_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(entry.user_id.as_uuid())
        .bind(entry.tenant_id.map(|tenant_id| tenant_id.as_uuid()))
        .bind(entry.resource)
        .bind(entry.action)
        .bind(entry.resource_id)
        .bind(entry.result.as_str())
        .bind(entry.reason)
        .bind(entry.ip_address.map(|address| address.to_string()))
        .bind(entry.user_agent)
        .bind(entry.context)
        .bind(entry.occurred_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to append access audit entry: {error}"))
        })?;

        Ok(())
    }
}
