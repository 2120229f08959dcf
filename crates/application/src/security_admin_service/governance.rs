use super::*;

use scopegate_core::{BranchRuleId, NonEmptyString, PolicyId, RestrictionId};
use scopegate_domain::{
    AccessPolicy, BranchAccessRule, PolicyTarget, ResourceRestriction, RestrictionInput,
    RestrictionScope,
};

use crate::CatalogBootstrapSummary;
use crate::security_admin_ports::{
    CreateAccessPolicyInput, CreateBranchAccessRuleInput, CreateRestrictionInput,
};

impl SecurityAdminService {
    /// Creates a resource restriction. Global restrictions require a system role.
    pub async fn create_restriction(
        &self,
        actor: UserId,
        input: CreateRestrictionInput,
        context: &RequestContext,
    ) -> AppResult<ResourceRestriction> {
        let actor = self
            .require(actor, AdminPermission::RestrictionsManage, context)
            .await?;

        let tenant_id = match input.scope {
            RestrictionScope::Global => {
                if !self.authorization_service.holds_system_role(actor.id).await? {
                    return Err(forbidden(&actor, "cannot create global restrictions"));
                }
                None
            }
            RestrictionScope::Agency | RestrictionScope::Branch => Some(actor.tenant_id),
        };

        let restriction = ResourceRestriction::new(
            RestrictionId::new(),
            RestrictionInput {
                name: input.name,
                scope: input.scope,
                tenant_id,
                branch_id: input.branch_id,
                resource: input.resource,
                kind: input.kind,
            },
        )?;
        self.repository
            .create_restriction(restriction.clone())
            .await?;

        self.record(
            &actor,
            AuditAction::SecurityRestrictionCreated,
            "rbac_restriction",
            restriction.id().to_string(),
            format!(
                "created {} restriction '{}' on '{}'",
                restriction.kind().as_str(),
                restriction.name(),
                restriction.resource()
            ),
        )
        .await;

        Ok(restriction)
    }

    /// Creates a prioritized allow/deny policy in the actor's tenant.
    pub async fn create_access_policy(
        &self,
        actor: UserId,
        input: CreateAccessPolicyInput,
        context: &RequestContext,
    ) -> AppResult<AccessPolicy> {
        let actor = self
            .require(actor, AdminPermission::PoliciesManage, context)
            .await?;

        if let PolicyTarget::Role(role_id) = input.target
            && self.tenant_graph(actor.tenant_id).await?.role(role_id).is_none()
        {
            return Err(AppError::NotFound(format!(
                "policy target role '{role_id}' does not exist"
            )));
        }

        let policy = AccessPolicy {
            id: PolicyId::new(),
            tenant_id: actor.tenant_id,
            name: NonEmptyString::new(input.name)?,
            resource: non_blank(input.resource, "policy resource")?,
            action: non_blank(input.action, "policy action")?,
            target: input.target,
            effect: input.effect,
            conditions: input.conditions,
            priority: input.priority,
            is_active: true,
        };
        self.repository.create_access_policy(policy.clone()).await?;

        self.record(
            &actor,
            AuditAction::SecurityPolicyCreated,
            "rbac_policy",
            policy.id.to_string(),
            format!(
                "created {} policy '{}' on '{}.{}' at priority {}",
                policy.effect.as_str(),
                policy.name,
                policy.resource,
                policy.action,
                policy.priority
            ),
        )
        .await;

        Ok(policy)
    }

    /// Creates a rule confining matching roles to a set of branches.
    pub async fn create_branch_access_rule(
        &self,
        actor: UserId,
        input: CreateBranchAccessRuleInput,
        context: &RequestContext,
    ) -> AppResult<BranchAccessRule> {
        let actor = self
            .require(actor, AdminPermission::BranchesManage, context)
            .await?;

        if input.branch_ids.is_empty() {
            return Err(AppError::Validation(
                "branch access rule must list at least one branch".to_owned(),
            ));
        }
        if let Some(role_id) = input.role_id
            && self.tenant_graph(actor.tenant_id).await?.role(role_id).is_none()
        {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' does not exist"
            )));
        }

        let rule = BranchAccessRule {
            id: BranchRuleId::new(),
            tenant_id: actor.tenant_id,
            name: NonEmptyString::new(input.name)?.into(),
            role_id: input.role_id,
            resource: input.resource,
            action: input.action,
            branch_ids: input.branch_ids,
            is_active: true,
        };
        self.repository
            .create_branch_access_rule(rule.clone())
            .await?;

        self.record(
            &actor,
            AuditAction::SecurityBranchRuleCreated,
            "rbac_branch_rule",
            rule.id.to_string(),
            format!(
                "created branch rule '{}' over {} branches",
                rule.name,
                rule.branch_ids.len()
            ),
        )
        .await;

        Ok(rule)
    }

    /// Seeds the default roles of a tenant. Other tenants require a system role.
    pub async fn bootstrap_tenant(
        &self,
        actor: UserId,
        tenant_id: TenantId,
        context: &RequestContext,
    ) -> AppResult<CatalogBootstrapSummary> {
        let actor = self
            .require(actor, AdminPermission::SettingsManage, context)
            .await?;

        if tenant_id != actor.tenant_id
            && !self.authorization_service.holds_system_role(actor.id).await?
        {
            return Err(forbidden(
                &actor,
                format_args!("cannot bootstrap tenant '{tenant_id}'"),
            ));
        }

        self.catalog_service.bootstrap_tenant(tenant_id).await
    }
}

fn non_blank(value: String, label: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_owned())
}
