use async_trait::async_trait;

use scopegate_application::{AuthorizationRepository, BranchRepository, ResourceInstanceRepository};
use scopegate_core::{AppError, AppResult, BranchId, TenantId, UserId};
use scopegate_domain::{
    AccessPolicy, Branch, BranchAccessRule, Principal, ResourceInstance, ResourceRestriction, Role,
};

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::rbac_rows::{ROLE_COLUMNS, RoleRow, hydrate_roles};

/// PostgreSQL-backed repository for everything an access check reads.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct BranchRow {
    id: Uuid,
    tenant_id: Uuid,
    parent_branch_id: Option<Uuid>,
    name: String,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Self {
            id: BranchId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            parent_branch_id: row.parent_branch_id.map(BranchId::from_uuid),
            name: row.name,
        }
    }
}

#[derive(Debug, FromRow)]
struct ResourceInstanceRow {
    resource_type: String,
    id: String,
    tenant_id: Uuid,
    branch_id: Option<Uuid>,
    assigned_to: Option<Uuid>,
    created_by: Option<Uuid>,
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn find_principal(&self, user_id: UserId) -> AppResult<Option<Principal>> {
        self.find_principal_impl(user_id).await
    }

    async fn list_roles_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM rbac_roles
            WHERE tenant_id = $1 OR tenant_id IS NULL
            ORDER BY level DESC, slug
            "#
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        hydrate_roles(&self.pool, rows).await
    }

    async fn list_access_policies(&self, tenant_id: TenantId) -> AppResult<Vec<AccessPolicy>> {
        self.list_access_policies_impl(tenant_id).await
    }

    async fn list_resource_restrictions(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<ResourceRestriction>> {
        self.list_resource_restrictions_impl(tenant_id).await
    }

    async fn list_branch_access_rules(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<BranchAccessRule>> {
        self.list_branch_access_rules_impl(tenant_id).await
    }
}

#[async_trait]
impl BranchRepository for PostgresAuthorizationRepository {
    async fn list_branches_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Branch>> {
        let rows = sqlx::query_as::<_, BranchRow>(
            r#"
            SELECT id, tenant_id, parent_branch_id, name
            FROM branches
            WHERE tenant_id = $1
            ORDER BY name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list branches: {error}")))?;

        Ok(rows.into_iter().map(Branch::from).collect())
    }

    async fn list_all_branches(&self) -> AppResult<Vec<Branch>> {
        let rows = sqlx::query_as::<_, BranchRow>(
            r#"
            SELECT id, tenant_id, parent_branch_id, name
            FROM branches
            ORDER BY tenant_id, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list branches: {error}")))?;

        Ok(rows.into_iter().map(Branch::from).collect())
    }
}

#[async_trait]
impl ResourceInstanceRepository for PostgresAuthorizationRepository {
    async fn find_resource_instance(
        &self,
        resource_type: &str,
        resource_id: &str,
    ) -> AppResult<Option<ResourceInstance>> {
        let row = sqlx::query_as::<_, ResourceInstanceRow>(
            r#"
            SELECT resource_type, id, tenant_id, branch_id, assigned_to, created_by
            FROM resource_instances
            WHERE resource_type = $1 AND id = $2
            "#,
        )
        .bind(resource_type)
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load {resource_type} '{resource_id}': {error}"
            ))
        })?;

        Ok(row.map(|row| ResourceInstance {
            resource_type: row.resource_type,
            id: row.id,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            branch_id: row.branch_id.map(BranchId::from_uuid),
            assigned_to: row.assigned_to.map(UserId::from_uuid),
            created_by: row.created_by.map(UserId::from_uuid),
        }))
    }
}

mod governance;
mod principals;
