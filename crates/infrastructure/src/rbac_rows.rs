//! Row shapes and decoders shared by the RBAC Postgres repositories.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use scopegate_core::{AppError, AppResult, AssignmentId, BranchId, RoleId, TenantId, UserId};
use scopegate_domain::{
    AccessLevel, ConditionSet, PermissionKey, Role, RoleAssignment, RoleInput,
    RolePermissionGrant, ScopeTag,
};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

pub(crate) const ROLE_COLUMNS: &str = r#"
    id, tenant_id, slug, name, level, scope, branch_id, parent_role_id, is_active
"#;

#[derive(Debug, FromRow)]
pub(crate) struct RoleRow {
    id: Uuid,
    tenant_id: Option<Uuid>,
    slug: String,
    name: String,
    level: i32,
    scope: String,
    branch_id: Option<Uuid>,
    parent_role_id: Option<Uuid>,
    is_active: bool,
}

pub(crate) const ASSIGNMENT_COLUMNS: &str = r#"
    id, user_id, role_id, tenant_id, branch_id, expires_at, assigned_by, is_active
"#;

#[derive(Debug, FromRow)]
pub(crate) struct AssignmentRow {
    id: Uuid,
    user_id: Uuid,
    role_id: Uuid,
    tenant_id: Uuid,
    branch_id: Option<Uuid>,
    expires_at: Option<DateTime<Utc>>,
    assigned_by: Option<Uuid>,
    is_active: bool,
}

pub(crate) fn assignment_from_row(row: AssignmentRow) -> RoleAssignment {
    RoleAssignment {
        assignment_id: AssignmentId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        role_id: RoleId::from_uuid(row.role_id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        branch_id: row.branch_id.map(BranchId::from_uuid),
        expires_at: row.expires_at,
        assigned_by: row.assigned_by.map(UserId::from_uuid),
        is_active: row.is_active,
    }
}

#[derive(Debug, FromRow)]
struct RoleGrantRow {
    role_id: Uuid,
    resource: String,
    action: String,
    access_level: String,
    conditions: Value,
    is_active: bool,
}

/// Loads grants for the given role rows and assembles domain roles.
pub(crate) async fn hydrate_roles(pool: &PgPool, rows: Vec<RoleRow>) -> AppResult<Vec<Role>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let role_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let grant_rows = sqlx::query_as::<_, RoleGrantRow>(
        r#"
        SELECT role_id, resource, action, access_level, conditions, is_active
        FROM rbac_role_grants
        WHERE role_id = ANY($1)
        ORDER BY resource, action
        "#,
    )
    .bind(&role_ids)
    .fetch_all(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to load role grants: {error}")))?;

    let mut grants: HashMap<Uuid, Vec<RolePermissionGrant>> = HashMap::new();
    for row in grant_rows {
        let role_id = row.role_id;
        grants.entry(role_id).or_default().push(decode_role_grant(row)?);
    }

    rows.into_iter()
        .map(|row| {
            let role_grants = grants.remove(&row.id).unwrap_or_default();
            decode_role(row, role_grants)
        })
        .collect()
}

fn decode_role(row: RoleRow, grants: Vec<RolePermissionGrant>) -> AppResult<Role> {
    let scope = ScopeTag::from_str(row.scope.as_str()).map_err(|error| {
        AppError::Internal(format!("role '{}' has an invalid scope: {error}", row.slug))
    })?;

    Role::new(
        RoleId::from_uuid(row.id),
        RoleInput {
            tenant_id: row.tenant_id.map(TenantId::from_uuid),
            slug: row.slug.clone(),
            name: row.name,
            level: row.level,
            scope,
            branch_id: row.branch_id.map(BranchId::from_uuid),
            parent_role_id: row.parent_role_id.map(RoleId::from_uuid),
            grants,
        },
    )
    .map(|role| role.with_active(row.is_active))
    .map_err(|error| AppError::Internal(format!("failed to decode role '{}': {error}", row.slug)))
}

fn decode_role_grant(row: RoleGrantRow) -> AppResult<RolePermissionGrant> {
    Ok(RolePermissionGrant {
        permission: PermissionKey::new(row.resource, row.action).map_err(internal_decode)?,
        access_level: AccessLevel::from_str(row.access_level.as_str())
            .map_err(internal_decode)?,
        conditions: ConditionSet::from_json(&row.conditions).map_err(internal_decode)?,
        is_active: row.is_active,
    })
}

/// Wraps a stored-value decoding failure as an internal error.
pub(crate) fn internal_decode(error: AppError) -> AppError {
    AppError::Internal(format!("failed to decode stored rbac row: {error}"))
}

/// Inserts a role and its grants.
///
/// Returns `false` without touching grants when `skip_existing` is set and the
/// slug is already taken in the role's tenant.
pub(crate) async fn insert_role(
    transaction: &mut Transaction<'_, Postgres>,
    role: &Role,
    skip_existing: bool,
) -> AppResult<bool> {
    let statement = if skip_existing {
        r#"
        INSERT INTO rbac_roles (
            id, tenant_id, slug, name, level, scope, branch_id, parent_role_id, is_active
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT DO NOTHING
        "#
    } else {
        r#"
        INSERT INTO rbac_roles (
            id, tenant_id, slug, name, level, scope, branch_id, parent_role_id, is_active
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#
    };

    let inserted = sqlx::query(statement)
        .bind(role.id().as_uuid())
        .bind(role.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
        .bind(role.slug())
        .bind(role.name())
        .bind(role.level())
        .bind(role.scope().as_str())
        .bind(role.branch_id().map(|branch_id| branch_id.as_uuid()))
        .bind(role.parent_role_id().map(|parent_id| parent_id.as_uuid()))
        .bind(role.is_active())
        .execute(&mut **transaction)
        .await
        .map_err(|error| map_role_insert_error(error, role.slug()))?
        .rows_affected();

    if inserted == 0 {
        return Ok(false);
    }

    for grant in role.grants() {
        sqlx::query(
            r#"
            INSERT INTO rbac_role_grants (role_id, resource, action, access_level, conditions, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (role_id, resource, action) DO NOTHING
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(grant.permission.resource())
        .bind(grant.permission.action())
        .bind(grant.access_level.as_str())
        .bind(grant.conditions.to_json())
        .bind(grant.is_active)
        .execute(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist role grants: {error}")))?;
    }

    Ok(true)
}

fn map_role_insert_error(error: sqlx::Error, slug: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error {
        match database_error.code().as_deref() {
            Some("23505") => return AppError::Conflict(format!("role '{slug}' already exists")),
            Some("23503") => {
                return AppError::NotFound(format!(
                    "role '{slug}' references a missing tenant, branch or parent role"
                ));
            }
            _ => {}
        }
    }

    AppError::Internal(format!("failed to create role: {error}"))
}

/// Begins a transaction with the repository's error mapping.
pub(crate) async fn begin(pool: &PgPool) -> AppResult<Transaction<'static, Postgres>> {
    pool.begin()
        .await
        .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))
}

/// Commits a transaction with the repository's error mapping.
pub(crate) async fn commit(transaction: Transaction<'_, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
}
