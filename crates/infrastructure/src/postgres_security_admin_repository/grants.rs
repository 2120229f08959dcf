use crate::rbac_rows::{ASSIGNMENT_COLUMNS, AssignmentRow, assignment_from_row};

use super::*;

impl PostgresSecurityAdminRepository {
    pub(super) async fn create_role_assignment_impl(
        &self,
        assignment: RoleAssignment,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rbac_role_assignments (
                id, user_id, role_id, tenant_id, branch_id, expires_at, assigned_by, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(assignment.assignment_id.as_uuid())
        .bind(assignment.user_id.as_uuid())
        .bind(assignment.role_id.as_uuid())
        .bind(assignment.tenant_id.as_uuid())
        .bind(assignment.branch_id.map(|branch_id| branch_id.as_uuid()))
        .bind(assignment.expires_at)
        .bind(assignment.assigned_by.map(|user_id| user_id.as_uuid()))
        .bind(assignment.is_active)
        .execute(&self.pool)
        .await
        .map_err(|error| map_missing_reference(error, "role assignment"))?;

        Ok(())
    }

    pub(super) async fn deactivate_role_assignment_impl(
        &self,
        tenant_id: TenantId,
        assignment_id: AssignmentId,
    ) -> AppResult<RoleAssignment> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            r#"
            UPDATE rbac_role_assignments
            SET is_active = false
            WHERE id = $1 AND tenant_id = $2
            RETURNING {ASSIGNMENT_COLUMNS}
            "#
        ))
        .bind(assignment_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to deactivate role assignment: {error}"))
        })?;

        row.map(assignment_from_row).ok_or_else(|| {
            AppError::NotFound(format!("assignment '{assignment_id}' does not exist"))
        })
    }

    pub(super) async fn create_user_grant_impl(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        grant: UserPermissionGrant,
    ) -> AppResult<()> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO rbac_user_grants (
                id, user_id, tenant_id, resource, action, access_level,
                conditions, expires_at, is_active
            )
            SELECT $1, principals.id, principals.tenant_id, $4, $5, $6, $7, $8, $9
            FROM principals
            WHERE principals.id = $2 AND principals.tenant_id = $3
            "#,
        )
        .bind(grant.grant_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(grant.permission.resource())
        .bind(grant.permission.action())
        .bind(grant.access_level.as_str())
        .bind(grant.conditions.to_json())
        .bind(grant.expires_at)
        .bind(grant.is_active)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create user grant: {error}")))?
        .rows_affected();

        if inserted == 0 {
            return Err(AppError::NotFound(format!(
                "principal '{user_id}' does not exist"
            )));
        }

        Ok(())
    }

    pub(super) async fn revoke_user_grant_impl(
        &self,
        tenant_id: TenantId,
        grant_id: GrantId,
    ) -> AppResult<()> {
        let revoked = sqlx::query(
            r#"
            UPDATE rbac_user_grants
            SET is_active = false
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(grant_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke user grant: {error}")))?
        .rows_affected();

        if revoked == 0 {
            return Err(AppError::NotFound(format!("grant '{grant_id}' does not exist")));
        }

        Ok(())
    }
}

fn map_missing_reference(error: sqlx::Error, label: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::NotFound(format!("{label} references a missing principal or role"));
    }

    AppError::Internal(format!("failed to create {label}: {error}"))
}
