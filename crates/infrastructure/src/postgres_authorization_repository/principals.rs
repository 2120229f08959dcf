use std::str::FromStr;

use chrono::{DateTime, Utc};
use scopegate_core::GrantId;
use scopegate_domain::{
    AccessLevel, ConditionSet, PermissionKey, PrincipalStatus, UserPermissionGrant,
};
use serde_json::Value;

use crate::rbac_rows::{ASSIGNMENT_COLUMNS, AssignmentRow, assignment_from_row, internal_decode};

use super::*;

#[derive(Debug, FromRow)]
struct PrincipalRow {
    id: Uuid,
    tenant_id: Uuid,
    branch_id: Option<Uuid>,
    status: String,
    legacy_role: Option<String>,
}

#[derive(Debug, FromRow)]
struct UserGrantRow {
    id: Uuid,
    resource: String,
    action: String,
    access_level: String,
    conditions: Value,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
}

impl PostgresAuthorizationRepository {
    pub(super) async fn find_principal_impl(&self, user_id: UserId) -> AppResult<Option<Principal>> {
        let Some(row) = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, tenant_id, branch_id, status, legacy_role
            FROM principals
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load principal: {error}")))?
        else {
            return Ok(None);
        };

        let managed_branch_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT branch_id
            FROM principal_managed_branches
            WHERE user_id = $1
            ORDER BY branch_id
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load managed branches: {error}"))
        })?;

        let assignments = sqlx::query_as::<_, AssignmentRow>(&format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS}
            FROM rbac_role_assignments
            WHERE user_id = $1
            ORDER BY created_at
            "#
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role assignments: {error}")))?;

        let grants = sqlx::query_as::<_, UserGrantRow>(
            r#"
            SELECT id, resource, action, access_level, conditions, expires_at, is_active
            FROM rbac_user_grants
            WHERE user_id = $1 AND tenant_id = $2
            ORDER BY created_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(row.tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load user grants: {error}")))?;

        Ok(Some(Principal {
            id: UserId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            branch_id: row.branch_id.map(BranchId::from_uuid),
            status: PrincipalStatus::from_str(row.status.as_str()).map_err(internal_decode)?,
            legacy_role: row.legacy_role,
            managed_branch_ids: managed_branch_ids
                .into_iter()
                .map(BranchId::from_uuid)
                .collect(),
            role_assignments: assignments.into_iter().map(assignment_from_row).collect(),
            permission_grants: grants
                .into_iter()
                .map(user_grant_from_row)
                .collect::<AppResult<Vec<_>>>()?,
        }))
    }
}

fn user_grant_from_row(row: UserGrantRow) -> AppResult<UserPermissionGrant> {
    Ok(UserPermissionGrant {
        grant_id: GrantId::from_uuid(row.id),
        permission: PermissionKey::new(row.resource, row.action).map_err(internal_decode)?,
        access_level: AccessLevel::from_str(row.access_level.as_str())
            .map_err(internal_decode)?,
        conditions: ConditionSet::from_json(&row.conditions).map_err(internal_decode)?,
        expires_at: row.expires_at,
        is_active: row.is_active,
    })
}
