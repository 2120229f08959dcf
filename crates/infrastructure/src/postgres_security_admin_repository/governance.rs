use super::*;

impl PostgresSecurityAdminRepository {
    pub(super) async fn create_restriction_impl(
        &self,
        restriction: ResourceRestriction,
    ) -> AppResult<()> {
        let kind = serde_json::to_value(restriction.kind()).map_err(|error| {
            AppError::Internal(format!(
                "failed to encode restriction '{}': {error}",
                restriction.name()
            ))
        })?;

        sqlx::query(
            r#"
            INSERT INTO rbac_resource_restrictions (
                id, name, scope, tenant_id, branch_id, resource, kind, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(restriction.id().as_uuid())
        .bind(restriction.name())
        .bind(restriction.scope().as_str())
        .bind(restriction.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
        .bind(restriction.branch_id().map(|branch_id| branch_id.as_uuid()))
        .bind(restriction.resource())
        .bind(kind)
        .bind(restriction.is_active())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create restriction: {error}")))?;

        Ok(())
    }

    pub(super) async fn create_access_policy_impl(&self, policy: AccessPolicy) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rbac_access_policies (
                id, tenant_id, name, resource, action, target_type, target_id,
                effect, conditions, priority, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(policy.id.as_uuid())
        .bind(policy.tenant_id.as_uuid())
        .bind(policy.name.as_str())
        .bind(policy.resource.as_str())
        .bind(policy.action.as_str())
        .bind(policy.target.type_str())
        .bind(policy.target.id())
        .bind(policy.effect.as_str())
        .bind(policy.conditions.to_json())
        .bind(policy.priority)
        .bind(policy.is_active)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create access policy: {error}")))?;

        Ok(())
    }

    pub(super) async fn create_branch_access_rule_impl(
        &self,
        rule: BranchAccessRule,
    ) -> AppResult<()> {
        let branch_ids: Vec<uuid::Uuid> = rule
            .branch_ids
            .iter()
            .map(|branch_id| branch_id.as_uuid())
            .collect();

        sqlx::query(
            r#"
            INSERT INTO rbac_branch_access_rules (
                id, tenant_id, name, role_id, resource, action, branch_ids, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(rule.id.as_uuid())
        .bind(rule.tenant_id.as_uuid())
        .bind(rule.name.as_str())
        .bind(rule.role_id.map(|role_id| role_id.as_uuid()))
        .bind(rule.resource.as_deref())
        .bind(rule.action.as_deref())
        .bind(&branch_ids)
        .bind(rule.is_active)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to create branch access rule: {error}"))
        })?;

        Ok(())
    }
}
