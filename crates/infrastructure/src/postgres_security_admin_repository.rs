use async_trait::async_trait;
use sqlx::PgPool;

use scopegate_application::{AuthorizationRepository, SecurityAdminRepository};
use scopegate_core::{AppError, AppResult, AssignmentId, GrantId, RoleId, TenantId, UserId};
use scopegate_domain::{
    AccessPolicy, BranchAccessRule, ResourceRestriction, Role, RoleAssignment, UserPermissionGrant,
};

use crate::PostgresAuthorizationRepository;
use crate::rbac_rows::{begin, commit, insert_role};

/// PostgreSQL-backed repository for role, grant and governance administration.
#[derive(Clone)]
pub struct PostgresSecurityAdminRepository {
    pool: PgPool,
    reader: PostgresAuthorizationRepository,
}

impl PostgresSecurityAdminRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            reader: PostgresAuthorizationRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl SecurityAdminRepository for PostgresSecurityAdminRepository {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        self.reader.list_roles_for_tenant(tenant_id).await
    }

    async fn create_role(&self, role: Role) -> AppResult<Role> {
        let mut transaction = begin(&self.pool).await?;
        insert_role(&mut transaction, &role, false).await?;
        commit(transaction).await?;
        Ok(role)
    }

    async fn update_role_parent(
        &self,
        role_id: RoleId,
        parent_role_id: Option<RoleId>,
    ) -> AppResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE rbac_roles
            SET parent_role_id = $2
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(parent_role_id.map(|parent_id| parent_id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update role parent: {error}")))?
        .rows_affected();

        if updated == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
        }

        Ok(())
    }

    async fn create_role_assignment(&self, assignment: RoleAssignment) -> AppResult<()> {
        self.create_role_assignment_impl(assignment).await
    }

    async fn deactivate_role_assignment(
        &self,
        tenant_id: TenantId,
        assignment_id: AssignmentId,
    ) -> AppResult<RoleAssignment> {
        self.deactivate_role_assignment_impl(tenant_id, assignment_id)
            .await
    }

    async fn create_user_grant(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        grant: UserPermissionGrant,
    ) -> AppResult<()> {
        self.create_user_grant_impl(tenant_id, user_id, grant).await
    }

    async fn revoke_user_grant(&self, tenant_id: TenantId, grant_id: GrantId) -> AppResult<()> {
        self.revoke_user_grant_impl(tenant_id, grant_id).await
    }

    async fn create_restriction(&self, restriction: ResourceRestriction) -> AppResult<()> {
        self.create_restriction_impl(restriction).await
    }

    async fn create_access_policy(&self, policy: AccessPolicy) -> AppResult<()> {
        self.create_access_policy_impl(policy).await
    }

    async fn create_branch_access_rule(&self, rule: BranchAccessRule) -> AppResult<()> {
        self.create_branch_access_rule_impl(rule).await
    }
}

mod governance;
mod grants;
