use super::*;

use chrono::{Datelike, Timelike};
use scopegate_core::TenantId;
use scopegate_domain::{
    AccessLevel, AccessPolicy, AccessResult, ConditionContext, PolicyEffect, PolicyTarget,
    ResourceRestriction, RestrictionProbe, sort_by_priority,
};

/// Principal and roles loaded once per check.
pub(super) struct Subject {
    pub(super) principal: Principal,
    pub(super) graph: RoleGraph,
    pub(super) roles: EffectiveRoles,
}

/// Outcome of loading the principal before any rule is evaluated.
pub(super) enum SubjectLookup {
    Found(Box<Subject>),
    Denied {
        tenant_id: Option<TenantId>,
        decision: AccessDecision,
    },
}

/// Rule that allowed a request before restrictions and projections apply.
pub(super) struct MatchedGrant {
    pub(super) reason: String,
    pub(super) rules: Vec<String>,
    pub(super) access_level: Option<AccessLevel>,
}

enum GrantOutcome {
    Allowed(MatchedGrant),
    Denied(AccessDecision),
    NoMatch,
}

impl AuthorizationService {
    pub(super) async fn load_subject(
        &self,
        principal_id: UserId,
        context: &RequestContext,
    ) -> AppResult<SubjectLookup> {
        let Some(principal) = self.repository.find_principal(principal_id).await? else {
            return Ok(SubjectLookup::Denied {
                tenant_id: None,
                decision: AccessDecision::deny(
                    AccessResult::Denied,
                    AccessDecision::PRINCIPAL_NOT_FOUND,
                    Vec::new(),
                ),
            });
        };

        if !principal.is_active() {
            return Ok(SubjectLookup::Denied {
                tenant_id: Some(principal.tenant_id),
                decision: AccessDecision::deny(
                    AccessResult::Denied,
                    format!("principal {}", principal.status.as_str()),
                    Vec::new(),
                ),
            });
        }

        let graph = RoleGraph::new(
            self.repository
                .list_roles_for_tenant(principal.tenant_id)
                .await?,
        );

        let roles = match graph.effective_roles(&principal, context.requested_at) {
            Ok(roles) => roles,
            Err(AppError::Integrity(message)) => {
                tracing::error!(
                    principal_id = %principal.id,
                    tenant_id = %principal.tenant_id,
                    %message,
                    "role hierarchy integrity violation"
                );
                return Ok(SubjectLookup::Denied {
                    tenant_id: Some(principal.tenant_id),
                    decision: AccessDecision::deny(
                        AccessResult::Denied,
                        "role hierarchy integrity violation",
                        Vec::new(),
                    ),
                });
            }
            Err(error) => return Err(error),
        };

        Ok(SubjectLookup::Found(Box::new(Subject {
            principal,
            graph,
            roles,
        })))
    }

    /// Runs restrictions, policies and grants, then projects scope on allow.
    pub(super) async fn evaluate(
        &self,
        subject: &Subject,
        check: &PermissionCheck,
        context: &RequestContext,
        requested_scope: Option<ScopeTag>,
    ) -> AppResult<AccessDecision> {
        let principal = &subject.principal;
        let conditions = condition_context(subject, check, context);
        let probe = RestrictionProbe {
            ip_address: context.ip_address,
            at: context.requested_at,
            conditions: &conditions,
        };
        let restrictions = self
            .repository
            .list_resource_restrictions(principal.tenant_id)
            .await?;

        if let Some(restriction) = restrictions.iter().find(|restriction| {
            restriction.is_system_wide() && vetoes(restriction, principal, &probe)
        }) {
            return Ok(AccessDecision::deny(
                AccessResult::Restricted,
                format!("restricted by system restriction '{}'", restriction.name()),
                vec![restriction_label(restriction)],
            ));
        }

        let mut policies = self
            .repository
            .list_access_policies(principal.tenant_id)
            .await?;
        sort_by_priority(&mut policies);

        let mut outcome = match_policies(subject, &policies, check, &conditions);
        if matches!(outcome, GrantOutcome::NoMatch) {
            outcome = match_user_grants(principal, check, &conditions, context);
        }
        if matches!(outcome, GrantOutcome::NoMatch) {
            outcome = match_role_grants(&subject.roles, check, &conditions);
        }

        let grant = match outcome {
            GrantOutcome::Allowed(grant) => grant,
            GrantOutcome::Denied(decision) => return Ok(decision),
            GrantOutcome::NoMatch => {
                return Ok(deny_without_grant(subject, check, &conditions, context));
            }
        };

        if let Some(restriction) = restrictions.iter().find(|restriction| {
            !restriction.is_system_wide()
                && restriction.covers_resource(&check.resource)
                && vetoes(restriction, principal, &probe)
        }) {
            let mut rules = grant.rules;
            rules.push(restriction_label(restriction));
            return Ok(AccessDecision::deny(
                AccessResult::Restricted,
                format!("restricted by resource restriction '{}'", restriction.name()),
                rules,
            ));
        }

        self.project_allow(subject, check, grant, requested_scope)
            .await
    }
}

fn vetoes(
    restriction: &ResourceRestriction,
    principal: &Principal,
    probe: &RestrictionProbe<'_>,
) -> bool {
    restriction.applies_to(principal.tenant_id, principal.branch_id) && restriction.matches(probe)
}

fn restriction_label(restriction: &ResourceRestriction) -> String {
    format!("restriction:{}", restriction.name())
}

fn policy_targets(policy: &AccessPolicy, subject: &Subject) -> bool {
    match policy.target {
        PolicyTarget::User(user_id) => user_id == subject.principal.id,
        PolicyTarget::Role(role_id) => subject.roles.contains(role_id),
        PolicyTarget::Branch(branch_id) => subject.principal.branch_id == Some(branch_id),
    }
}

fn match_policies(
    subject: &Subject,
    policies: &[AccessPolicy],
    check: &PermissionCheck,
    conditions: &ConditionContext,
) -> GrantOutcome {
    let Some(policy) = policies.iter().find(|policy| {
        policy.covers(&check.resource, &check.action)
            && policy_targets(policy, subject)
            && policy.conditions.evaluate(conditions)
    }) else {
        return GrantOutcome::NoMatch;
    };

    let label = format!("policy:{}", policy.name);
    match policy.effect {
        PolicyEffect::Deny => GrantOutcome::Denied(AccessDecision::deny(
            AccessResult::Denied,
            format!("denied by policy '{}'", policy.name),
            vec![label],
        )),
        PolicyEffect::Allow => GrantOutcome::Allowed(MatchedGrant {
            reason: format!("allowed by policy '{}'", policy.name),
            rules: vec![label],
            access_level: None,
        }),
    }
}

fn match_user_grants(
    principal: &Principal,
    check: &PermissionCheck,
    conditions: &ConditionContext,
    context: &RequestContext,
) -> GrantOutcome {
    let applicable: Vec<_> = principal
        .permission_grants
        .iter()
        .filter(|grant| {
            grant.is_active
                && !grant.is_expired_at(context.requested_at)
                && grant.permission.covers(&check.resource, &check.action)
                && grant.conditions.evaluate(conditions)
        })
        .collect();

    if let Some(denial) = applicable
        .iter()
        .find(|grant| !grant.access_level.grants_access())
    {
        return GrantOutcome::Denied(AccessDecision::deny(
            AccessResult::Denied,
            format!("explicitly denied by user grant '{}'", denial.permission),
            vec![format!("user_grant:{}", denial.grant_id)],
        ));
    }

    applicable
        .iter()
        .max_by_key(|grant| grant.access_level)
        .map_or(GrantOutcome::NoMatch, |grant| {
            GrantOutcome::Allowed(MatchedGrant {
                reason: format!("allowed by user grant '{}'", grant.permission),
                rules: vec![format!("user_grant:{}", grant.grant_id)],
                access_level: Some(grant.access_level),
            })
        })
}

fn match_role_grants(
    roles: &EffectiveRoles,
    check: &PermissionCheck,
    conditions: &ConditionContext,
) -> GrantOutcome {
    roles
        .permissions()
        .filter(|(_, grant)| {
            grant.access_level.grants_access()
                && grant.permission.covers(&check.resource, &check.action)
                && grant.conditions.evaluate(conditions)
        })
        .max_by_key(|(_, grant)| grant.access_level)
        .map_or(GrantOutcome::NoMatch, |(role, grant)| {
            GrantOutcome::Allowed(MatchedGrant {
                reason: format!("allowed by role '{}'", role.slug()),
                rules: vec![format!("role:{}", role.slug())],
                access_level: Some(grant.access_level),
            })
        })
}

fn deny_without_grant(
    subject: &Subject,
    check: &PermissionCheck,
    conditions: &ConditionContext,
    context: &RequestContext,
) -> AccessDecision {
    let now = context.requested_at;
    let expired_user_grant = subject.principal.permission_grants.iter().any(|grant| {
        grant.is_active
            && grant.is_expired_at(now)
            && grant.access_level.grants_access()
            && grant.permission.covers(&check.resource, &check.action)
            && grant.conditions.evaluate(conditions)
    });
    let expired_role_grant = || {
        subject
            .graph
            .expired_roles(&subject.principal, now)
            .is_ok_and(|expired| {
                matches!(
                    match_role_grants(&expired, check, conditions),
                    GrantOutcome::Allowed(_)
                )
            })
    };

    if expired_user_grant || expired_role_grant() {
        return AccessDecision::deny(
            AccessResult::Expired,
            "permission grant or role assignment expired",
            Vec::new(),
        );
    }

    AccessDecision::deny(AccessResult::Denied, "insufficient permissions", Vec::new())
}

/// Builds the key/value view conditions are evaluated against.
fn condition_context(
    subject: &Subject,
    check: &PermissionCheck,
    context: &RequestContext,
) -> ConditionContext {
    let principal = &subject.principal;
    let mut values = ConditionContext::new();

    values.insert("principal.id", principal.id.to_string());
    values.insert("principal.tenant_id", principal.tenant_id.to_string());
    values.insert_optional(
        "principal.branch_id",
        principal.branch_id.map(|branch_id| branch_id.to_string()),
    );

    let primary_role = subject
        .roles
        .direct
        .iter()
        .max_by_key(|direct| direct.role.level())
        .map(|direct| direct.role.slug().to_owned())
        .or_else(|| principal.legacy_role.clone());
    values.insert_optional("principal.role", primary_role);
    values.insert(
        "principal.roles",
        subject
            .roles
            .all
            .iter()
            .map(|role| role.slug().to_owned())
            .collect::<Vec<_>>(),
    );

    values.insert_optional(
        "request.ip_address",
        context.ip_address.map(|address| address.to_string()),
    );
    values.insert_optional("request.user_agent", context.user_agent.clone());
    values.insert_optional(
        "request.branch_id",
        context.branch_id.map(|branch_id| branch_id.to_string()),
    );
    values.insert_optional(
        "request.agency_id",
        context.agency_id.map(|agency_id| agency_id.to_string()),
    );

    values.insert("resource.type", check.resource.clone());
    values.insert("resource.action", check.action.clone());
    values.insert_optional("resource.id", check.resource_id.clone());

    values.insert("time.hour", context.requested_at.hour());
    values.insert(
        "time.weekday",
        context.requested_at.weekday().number_from_monday(),
    );

    values
}
