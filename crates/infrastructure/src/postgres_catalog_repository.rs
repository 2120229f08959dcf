use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use scopegate_application::CatalogRepository;
use scopegate_core::{AppError, AppResult, TenantId};
use scopegate_domain::{Permission, Role};

use crate::rbac_rows::{ROLE_COLUMNS, RoleRow, begin, commit, hydrate_roles, insert_role};

/// PostgreSQL-backed repository for the permission catalog and built-in roles.
#[derive(Clone)]
pub struct PostgresCatalogRepository {
    pool: PgPool,
}

impl PostgresCatalogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    resource: String,
    action: String,
    category: String,
    description: String,
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn insert_permissions_if_absent(&self, permissions: &[Permission]) -> AppResult<usize> {
        let mut transaction = begin(&self.pool).await?;
        let mut inserted = 0;

        for permission in permissions {
            let affected = sqlx::query(
                r#"
                INSERT INTO rbac_permissions (resource, action, category, description)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (resource, action) DO NOTHING
                "#,
            )
            .bind(permission.key().resource())
            .bind(permission.key().action())
            .bind(permission.category())
            .bind(permission.description())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to seed permission '{}': {error}",
                    permission.slug()
                ))
            })?
            .rows_affected();

            inserted += usize::try_from(affected).unwrap_or(0);
        }

        commit(transaction).await?;
        Ok(inserted)
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT resource, action, category, description
            FROM rbac_permissions
            ORDER BY resource, action
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?;

        rows.into_iter()
            .map(|row| {
                Permission::new(row.resource, row.action, row.category, row.description).map_err(
                    |error| AppError::Internal(format!("failed to decode permission: {error}")),
                )
            })
            .collect()
    }

    async fn find_role_by_slug(
        &self,
        tenant_id: Option<TenantId>,
        slug: &str,
    ) -> AppResult<Option<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM rbac_roles
            WHERE tenant_id IS NOT DISTINCT FROM $1 AND slug = $2
            "#
        ))
        .bind(tenant_id.map(|tenant_id| tenant_id.as_uuid()))
        .bind(slug)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role '{slug}': {error}")))?;

        Ok(hydrate_roles(&self.pool, rows).await?.into_iter().next())
    }

    async fn insert_role_if_absent(&self, role: &Role) -> AppResult<bool> {
        let mut transaction = begin(&self.pool).await?;
        let inserted = insert_role(&mut transaction, role, true).await?;
        commit(transaction).await?;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests;
