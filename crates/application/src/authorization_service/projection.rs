use super::*;

use scopegate_domain::{FilterSubject, ResourcePolicy};

use super::evaluation::{MatchedGrant, Subject};
use crate::scope_resolver::ScopeResolver;

impl AuthorizationService {
    pub(super) async fn resolve_scope(
        &self,
        subject: &Subject,
        resource_type: &str,
        action: Option<&str>,
        requested_scope: Option<ScopeTag>,
    ) -> AppResult<ScopeResolution> {
        let principal = &subject.principal;
        let Some(widest) = ScopeResolver::new(&self.resource_policies, &[], &[]).widest_scope(
            principal,
            &subject.roles,
            resource_type,
            requested_scope,
        ) else {
            return Ok(ScopeResolution::default());
        };

        let branches = if widest == ScopeTag::Global {
            self.branch_repository.list_all_branches().await?
        } else {
            self.branch_repository
                .list_branches_for_tenant(principal.tenant_id)
                .await?
        };
        let rules = self
            .repository
            .list_branch_access_rules(principal.tenant_id)
            .await?;

        Ok(
            ScopeResolver::new(&self.resource_policies, &branches, &rules).resolve(
                principal,
                &subject.roles,
                resource_type,
                action,
                requested_scope,
            ),
        )
    }

    /// Attaches branches, field permissions and the data filter to an allow.
    pub(super) async fn project_allow(
        &self,
        subject: &Subject,
        check: &PermissionCheck,
        grant: MatchedGrant,
        requested_scope: Option<ScopeTag>,
    ) -> AppResult<AccessDecision> {
        let principal = &subject.principal;
        let mut resolution = self
            .resolve_scope(subject, &check.resource, Some(&check.action), requested_scope)
            .await?;

        // Grants held outside any role only reach the principal's own records.
        let scope = match resolution.scope {
            Some(scope) => scope,
            None => {
                resolution.branches = principal.branch_id.into_iter().collect();
                ScopeTag::Own
            }
        };

        let fallback_policy;
        let policy = match self.resource_policies.policy(&check.resource) {
            Some(policy) => policy,
            None => {
                fallback_policy = ResourcePolicy::new(check.resource.as_str());
                &fallback_policy
            }
        };

        let role_slugs: Vec<&str> = if subject.roles.is_empty() {
            principal.legacy_role.as_deref().into_iter().collect()
        } else {
            subject.roles.all.iter().map(|role| role.slug()).collect()
        };

        let field_permissions = policy.visible_field_permissions(role_slugs);
        let data_filter = policy.data_filter(
            scope,
            &FilterSubject {
                user_id: principal.id,
                tenant_id: principal.tenant_id,
                branch_id: principal.branch_id,
                accessible_branches: &resolution.branches,
            },
        );

        let mut rules = grant.rules;
        rules.extend(resolution.applied_rules);

        let mut decision = AccessDecision::allow(grant.reason, rules);
        decision.accessible_branches = resolution.branches;
        decision.branch_scope = Some(scope);
        decision.field_permissions = field_permissions;
        decision.data_filter = Some(data_filter);
        decision.access_level = grant.access_level;

        Ok(decision)
    }
}
