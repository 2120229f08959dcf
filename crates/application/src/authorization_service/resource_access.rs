use super::*;

use scopegate_core::TenantId;
use scopegate_domain::{AccessResult, ResourceInstance, ResourcePolicy};

use super::evaluation::Subject;
use crate::scope_resolver::ScopeResolver;

impl AuthorizationService {
    /// Decides access to one concrete resource instance and records it in the access log.
    pub async fn can_access_resource(
        &self,
        principal_id: UserId,
        resource_type: &str,
        resource_id: &str,
        action: &str,
        context: &RequestContext,
    ) -> AppResult<AccessDecision> {
        let check = PermissionCheck::new(resource_type, action)?.with_resource_id(resource_id);
        let (tenant_id, decision) = self
            .decide_resource_access(principal_id, &check, resource_id, context)
            .await?;

        self.audit_logger
            .log_decision(principal_id, tenant_id, &check, context, &decision)
            .await;

        Ok(decision)
    }

    async fn decide_resource_access(
        &self,
        principal_id: UserId,
        check: &PermissionCheck,
        resource_id: &str,
        context: &RequestContext,
    ) -> AppResult<(Option<TenantId>, AccessDecision)> {
        let instance = self
            .resource_repository
            .find_resource_instance(&check.resource, resource_id)
            .await?;

        let subject = match self.load_subject(principal_id, context).await? {
            SubjectLookup::Found(subject) => subject,
            SubjectLookup::Denied {
                tenant_id,
                decision,
            } => return Ok((tenant_id, decision)),
        };
        let tenant_id = Some(subject.principal.tenant_id);

        let Some(instance) = instance else {
            return Ok((
                tenant_id,
                AccessDecision::deny(AccessResult::Denied, "resource not found", Vec::new()),
            ));
        };

        if instance.tenant_id != subject.principal.tenant_id
            && !self.resolves_global(&subject, &check.resource)
        {
            return Ok((
                tenant_id,
                AccessDecision::deny(AccessResult::Denied, "tenant mismatch", Vec::new()),
            ));
        }

        let decision = self.evaluate(&subject, check, context, None).await?;
        if !decision.allowed {
            return Ok((tenant_id, decision));
        }

        Ok((tenant_id, self.confine_to_instance(&subject, &instance, decision)))
    }

    fn confine_to_instance(
        &self,
        subject: &Subject,
        instance: &ResourceInstance,
        decision: AccessDecision,
    ) -> AccessDecision {
        let scope = decision.branch_scope.unwrap_or(ScopeTag::Own);

        let branch_reachable = match instance.branch_id {
            Some(branch_id) => decision.accessible_branches.contains(&branch_id),
            None => scope >= ScopeTag::Agency,
        };
        if !branch_reachable {
            return decision.downgrade(AccessResult::Denied, "resource branch not accessible");
        }

        if !scope.is_record_level() {
            return decision;
        }

        let principal_id = subject.principal.id;
        let has_assignment = self
            .resource_policies
            .policy(&instance.resource_type)
            .is_some_and(ResourcePolicy::has_assignment);

        if has_assignment && !instance.is_assigned_to_or_created_by(principal_id) {
            return decision.downgrade(AccessResult::Denied, "resource not assigned to principal");
        }

        if !has_assignment && scope == ScopeTag::Own && instance.created_by != Some(principal_id) {
            return decision.downgrade(AccessResult::Denied, "resource not owned by principal");
        }

        decision
    }

    /// Returns whether a tenant-less role grants GLOBAL scope over the resource type.
    fn resolves_global(&self, subject: &Subject, resource_type: &str) -> bool {
        let resolver = ScopeResolver::new(&self.resource_policies, &[], &[]);
        subject.roles.direct.iter().any(|direct| {
            direct.role.is_system()
                && resolver.role_scope(&direct.role, resource_type) == ScopeTag::Global
        })
    }
}
