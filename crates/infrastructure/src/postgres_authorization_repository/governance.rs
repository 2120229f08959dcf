use std::collections::BTreeSet;
use std::str::FromStr;

use scopegate_core::{BranchRuleId, NonEmptyString, PolicyId, RestrictionId, RoleId};
use scopegate_domain::{
    ConditionSet, PolicyEffect, PolicyTarget, RestrictionInput, RestrictionKind, RestrictionScope,
};
use serde_json::Value;

use crate::rbac_rows::internal_decode;

use super::*;

#[derive(Debug, FromRow)]
struct PolicyRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    resource: String,
    action: String,
    target_type: String,
    target_id: Uuid,
    effect: String,
    conditions: Value,
    priority: i32,
    is_active: bool,
}

#[derive(Debug, FromRow)]
struct RestrictionRow {
    id: Uuid,
    name: String,
    scope: String,
    tenant_id: Option<Uuid>,
    branch_id: Option<Uuid>,
    resource: String,
    kind: Value,
    is_active: bool,
}

#[derive(Debug, FromRow)]
struct BranchRuleRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    role_id: Option<Uuid>,
    resource: Option<String>,
    action: Option<String>,
    branch_ids: Vec<Uuid>,
    is_active: bool,
}

impl PostgresAuthorizationRepository {
    pub(super) async fn list_access_policies_impl(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<AccessPolicy>> {
        let rows = sqlx::query_as::<_, PolicyRow>(
            r#"
            SELECT
                id, tenant_id, name, resource, action, target_type, target_id,
                effect, conditions, priority, is_active
            FROM rbac_access_policies
            WHERE tenant_id = $1
            ORDER BY priority DESC, created_at
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list access policies: {error}")))?;

        rows.into_iter()
            .map(|row| {
                Ok(AccessPolicy {
                    id: PolicyId::from_uuid(row.id),
                    tenant_id: TenantId::from_uuid(row.tenant_id),
                    name: NonEmptyString::new(row.name).map_err(internal_decode)?,
                    resource: row.resource,
                    action: row.action,
                    target: PolicyTarget::from_parts(row.target_type.as_str(), row.target_id)
                        .map_err(internal_decode)?,
                    effect: PolicyEffect::from_str(row.effect.as_str())
                        .map_err(internal_decode)?,
                    conditions: ConditionSet::from_json(&row.conditions)
                        .map_err(internal_decode)?,
                    priority: row.priority,
                    is_active: row.is_active,
                })
            })
            .collect()
    }

    pub(super) async fn list_resource_restrictions_impl(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<ResourceRestriction>> {
        let rows = sqlx::query_as::<_, RestrictionRow>(
            r#"
            SELECT id, name, scope, tenant_id, branch_id, resource, kind, is_active
            FROM rbac_resource_restrictions
            WHERE tenant_id = $1 OR tenant_id IS NULL
            ORDER BY created_at
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list resource restrictions: {error}"))
        })?;

        rows.into_iter()
            .map(|row| {
                let kind: RestrictionKind = serde_json::from_value(row.kind).map_err(|error| {
                    AppError::Internal(format!(
                        "restriction '{}' has an invalid kind: {error}",
                        row.name
                    ))
                })?;

                ResourceRestriction::new(
                    RestrictionId::from_uuid(row.id),
                    RestrictionInput {
                        name: row.name,
                        scope: RestrictionScope::from_str(row.scope.as_str())
                            .map_err(internal_decode)?,
                        tenant_id: row.tenant_id.map(TenantId::from_uuid),
                        branch_id: row.branch_id.map(BranchId::from_uuid),
                        resource: row.resource,
                        kind,
                    },
                )
                .map(|restriction| restriction.with_active(row.is_active))
                .map_err(internal_decode)
            })
            .collect()
    }

    pub(super) async fn list_branch_access_rules_impl(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<BranchAccessRule>> {
        let rows = sqlx::query_as::<_, BranchRuleRow>(
            r#"
            SELECT id, tenant_id, name, role_id, resource, action, branch_ids, is_active
            FROM rbac_branch_access_rules
            WHERE tenant_id = $1
            ORDER BY name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list branch access rules: {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| BranchAccessRule {
                id: BranchRuleId::from_uuid(row.id),
                tenant_id: TenantId::from_uuid(row.tenant_id),
                name: row.name,
                role_id: row.role_id.map(RoleId::from_uuid),
                resource: row.resource,
                action: row.action,
                branch_ids: row
                    .branch_ids
                    .into_iter()
                    .map(BranchId::from_uuid)
                    .collect::<BTreeSet<_>>(),
                is_active: row.is_active,
            })
            .collect())
    }
}
