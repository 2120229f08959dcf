use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use chrono::{Duration, Utc};
use scopegate_core::{
    AppError, AssignmentId, BranchId, GrantId, NonEmptyString, PolicyId, RestrictionId, RoleId,
    TenantId, UserId,
};
use scopegate_domain::{
    AccessLevel, AccessPolicy, AccessResult, Branch, Condition, ConditionOperator, ConditionSet,
    DataFilter, PermissionCheck, PermissionKey, PolicyEffect, PolicyTarget, Principal,
    PrincipalStatus, RequestContext, ResourceInstance, ResourcePolicyCatalog, ResourceRestriction,
    RestrictionInput, RestrictionKind, RestrictionScope, Role, RoleAssignment, RoleInput,
    RolePermissionGrant, ScopeTag, UserPermissionGrant,
};
use serde_json::json;

use crate::fakes::FakeRbacStore;

use super::AuthorizationService;

struct Fixture {
    store: Arc<FakeRbacStore>,
    service: AuthorizationService,
    tenant_id: TenantId,
    north: BranchId,
    south: BranchId,
}

impl Fixture {
    async fn new() -> Self {
        let store = Arc::new(FakeRbacStore::default());
        let tenant_id = TenantId::new();
        let north = BranchId::new();
        let south = BranchId::new();

        {
            let mut state = store.state.lock().await;
            state.branches.push(branch(tenant_id, north, "north"));
            state.branches.push(branch(tenant_id, south, "south"));
        }

        let service = AuthorizationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            ResourcePolicyCatalog::education_agency_defaults(),
            store.clone(),
        );

        Self {
            store,
            service,
            tenant_id,
            north,
            south,
        }
    }

    async fn add_role(
        &self,
        tenant_id: Option<TenantId>,
        slug: &str,
        scope: ScopeTag,
        parent_role_id: Option<RoleId>,
        grants: &[&str],
    ) -> Role {
        self.add_role_with_id(RoleId::new(), tenant_id, slug, scope, parent_role_id, grants)
            .await
    }

    async fn add_role_with_id(
        &self,
        role_id: RoleId,
        tenant_id: Option<TenantId>,
        slug: &str,
        scope: ScopeTag,
        parent_role_id: Option<RoleId>,
        grants: &[&str],
    ) -> Role {
        let role = Role::new(
            role_id,
            RoleInput {
                tenant_id,
                slug: slug.to_owned(),
                name: slug.to_owned(),
                level: 50,
                scope,
                branch_id: None,
                parent_role_id,
                grants: grants
                    .iter()
                    .map(|slug| RolePermissionGrant::full(key(slug)))
                    .collect(),
            },
        )
        .unwrap_or_else(|_| unreachable!());
        self.store.state.lock().await.roles.push(role.clone());
        role
    }

    async fn add_principal(&self, branch_id: Option<BranchId>, roles: &[&Role]) -> UserId {
        let user_id = UserId::new();
        let principal = Principal {
            id: user_id,
            tenant_id: self.tenant_id,
            branch_id,
            status: PrincipalStatus::Active,
            legacy_role: None,
            managed_branch_ids: Vec::new(),
            role_assignments: roles
                .iter()
                .map(|role| assignment(user_id, self.tenant_id, role.id()))
                .collect(),
            permission_grants: Vec::new(),
        };
        self.store.state.lock().await.principals.push(principal);
        user_id
    }

    async fn update_principal(&self, user_id: UserId, update: impl FnOnce(&mut Principal)) {
        let mut state = self.store.state.lock().await;
        if let Some(principal) = state
            .principals
            .iter_mut()
            .find(|principal| principal.id == user_id)
        {
            update(principal);
        }
    }

    async fn check(&self, user_id: UserId, resource: &str, action: &str) -> scopegate_domain::AccessDecision {
        self.check_with(user_id, resource, action, &RequestContext::now())
            .await
    }

    async fn check_with(
        &self,
        user_id: UserId,
        resource: &str,
        action: &str,
        context: &RequestContext,
    ) -> scopegate_domain::AccessDecision {
        let check = PermissionCheck::new(resource, action).unwrap_or_else(|_| unreachable!());
        self.service
            .check_permission(user_id, &check, context)
            .await
            .unwrap_or_else(|_| unreachable!())
    }

    async fn add_student(
        &self,
        tenant_id: TenantId,
        branch_id: Option<BranchId>,
        assigned_to: Option<UserId>,
    ) -> String {
        let id = format!("student-{}", uuid_suffix());
        self.store.state.lock().await.instances.push(ResourceInstance {
            resource_type: "students".to_owned(),
            id: id.clone(),
            tenant_id,
            branch_id,
            assigned_to,
            created_by: None,
        });
        id
    }

    async fn access(&self, user_id: UserId, resource_id: &str) -> scopegate_domain::AccessDecision {
        self.service
            .can_access_resource(user_id, "students", resource_id, "read", &RequestContext::now())
            .await
            .unwrap_or_else(|_| unreachable!())
    }
}

fn uuid_suffix() -> String {
    UserId::new().to_string()
}

fn branch(tenant_id: TenantId, id: BranchId, name: &str) -> Branch {
    Branch {
        id,
        tenant_id,
        parent_branch_id: None,
        name: name.to_owned(),
    }
}

fn key(slug: &str) -> PermissionKey {
    PermissionKey::from_slug(slug).unwrap_or_else(|_| unreachable!())
}

fn assignment(user_id: UserId, tenant_id: TenantId, role_id: RoleId) -> RoleAssignment {
    RoleAssignment {
        assignment_id: AssignmentId::new(),
        user_id,
        role_id,
        tenant_id,
        branch_id: None,
        expires_at: None,
        assigned_by: None,
        is_active: true,
    }
}

fn user_grant(slug: &str, access_level: AccessLevel) -> UserPermissionGrant {
    UserPermissionGrant {
        grant_id: GrantId::new(),
        permission: key(slug),
        access_level,
        conditions: ConditionSet::always(),
        expires_at: None,
        is_active: true,
    }
}

fn restriction(tenant_id: TenantId, resource: &str, kind: RestrictionKind) -> ResourceRestriction {
    ResourceRestriction::new(
        RestrictionId::new(),
        RestrictionInput {
            name: format!("{resource}-lockdown"),
            scope: RestrictionScope::Agency,
            tenant_id: Some(tenant_id),
            branch_id: None,
            resource: resource.to_owned(),
            kind,
        },
    )
    .unwrap_or_else(|_| unreachable!())
}

fn policy(
    tenant_id: TenantId,
    name: &str,
    target: PolicyTarget,
    effect: PolicyEffect,
    priority: i32,
) -> AccessPolicy {
    AccessPolicy {
        id: PolicyId::new(),
        tenant_id,
        name: NonEmptyString::new(name).unwrap_or_else(|_| unreachable!()),
        resource: "students".to_owned(),
        action: "*".to_owned(),
        target,
        effect,
        conditions: ConditionSet::always(),
        priority,
        is_active: true,
    }
}

#[tokio::test]
async fn principal_without_grants_is_denied_by_default() {
    let fixture = Fixture::new().await;
    let user_id = fixture.add_principal(Some(fixture.north), &[]).await;

    let decision = fixture.check(user_id, "students", "read").await;

    assert!(!decision.allowed);
    assert_eq!(decision.result, AccessResult::Denied);
    assert_eq!(decision.reason, "insufficient permissions");
}

#[tokio::test]
async fn unknown_and_inactive_principals_are_denied() {
    let fixture = Fixture::new().await;
    let consultant = fixture
        .add_role(Some(fixture.tenant_id), "consultant", ScopeTag::Assigned, None, &["students.read"])
        .await;
    let user_id = fixture.add_principal(Some(fixture.north), &[&consultant]).await;
    fixture
        .update_principal(user_id, |principal| principal.status = PrincipalStatus::Inactive)
        .await;

    let missing = fixture.check(UserId::new(), "students", "read").await;
    let inactive = fixture.check(user_id, "students", "read").await;

    assert_eq!(missing.reason, "principal not found");
    assert_eq!(inactive.reason, "principal inactive");
    assert!(!inactive.allowed);
}

#[tokio::test]
async fn consultant_reads_students_through_assigned_scope() {
    let fixture = Fixture::new().await;
    let consultant = fixture
        .add_role(Some(fixture.tenant_id), "consultant", ScopeTag::Assigned, None, &["students.read"])
        .await;
    let user_id = fixture.add_principal(Some(fixture.north), &[&consultant]).await;

    let decision = fixture.check(user_id, "students", "read").await;

    assert!(decision.allowed);
    assert_eq!(decision.branch_scope, Some(ScopeTag::Assigned));
    assert_eq!(decision.applied_rules, vec!["role:consultant".to_owned()]);
    assert!(decision.accessible_branches.contains(&fixture.north));
    assert!(!decision.accessible_branches.contains(&fixture.south));
    assert!(decision.field_permissions.contains_key("academic"));
    assert!(!decision.field_permissions.contains_key("financial"));
    assert_eq!(
        decision.data_filter,
        Some(DataFilter::Any {
            filters: vec![
                DataFilter::eq("assigned_to", user_id),
                DataFilter::eq("branch_id", fixture.north),
            ],
        })
    );
}

#[tokio::test]
async fn consultant_instance_access_requires_assignment_and_branch() {
    let fixture = Fixture::new().await;
    let consultant = fixture
        .add_role(Some(fixture.tenant_id), "consultant", ScopeTag::Assigned, None, &["students.read"])
        .await;
    let user_id = fixture.add_principal(Some(fixture.north), &[&consultant]).await;
    let colleague = UserId::new();

    let assigned = fixture
        .add_student(fixture.tenant_id, Some(fixture.north), Some(user_id))
        .await;
    let unassigned = fixture
        .add_student(fixture.tenant_id, Some(fixture.north), Some(colleague))
        .await;
    let elsewhere = fixture
        .add_student(fixture.tenant_id, Some(fixture.south), Some(user_id))
        .await;

    assert!(fixture.access(user_id, &assigned).await.allowed);
    assert_eq!(
        fixture.access(user_id, &unassigned).await.reason,
        "resource not assigned to principal"
    );
    assert_eq!(
        fixture.access(user_id, &elsewhere).await.reason,
        "resource branch not accessible"
    );
    assert_eq!(
        fixture.access(user_id, "student-missing").await.reason,
        "resource not found"
    );
}

#[tokio::test]
async fn agency_admin_sees_a_branch_created_after_assignment() {
    let fixture = Fixture::new().await;
    let admin = fixture
        .add_role(Some(fixture.tenant_id), "agency_admin", ScopeTag::Agency, None, &["students.*"])
        .await;
    let user_id = fixture.add_principal(Some(fixture.north), &[&admin]).await;
    let new_branch = BranchId::new();
    fixture
        .store
        .state
        .lock()
        .await
        .branches
        .push(branch(fixture.tenant_id, new_branch, "east"));
    let student = fixture
        .add_student(fixture.tenant_id, Some(new_branch), None)
        .await;

    let decision = fixture.check(user_id, "students", "read").await;

    assert!(decision.allowed);
    assert_eq!(decision.branch_scope, Some(ScopeTag::Agency));
    assert_eq!(decision.accessible_branches.len(), 3);
    assert!(fixture.access(user_id, &student).await.allowed);
}

#[tokio::test]
async fn resource_restriction_overrides_and_releases_an_allow() {
    let fixture = Fixture::new().await;
    let manager = fixture
        .add_role(Some(fixture.tenant_id), "branch_manager", ScopeTag::Branch, None, &["students.*"])
        .await;
    let user_id = fixture.add_principal(Some(fixture.north), &[&manager]).await;
    assert!(fixture.check(user_id, "students", "update").await.allowed);

    let lockdown = restriction(fixture.tenant_id, "students", RestrictionKind::KillSwitch);
    fixture
        .store
        .state
        .lock()
        .await
        .restrictions
        .push(lockdown.clone());

    let restricted = fixture.check(user_id, "students", "update").await;
    assert!(!restricted.allowed);
    assert_eq!(restricted.result, AccessResult::Restricted);
    assert!(restricted.reason.contains("students-lockdown"));
    assert_eq!(
        fixture.check(user_id, "tasks", "read").await.reason,
        "insufficient permissions"
    );

    fixture.store.state.lock().await.restrictions = vec![lockdown.with_active(false)];
    assert!(fixture.check(user_id, "students", "update").await.allowed);
}

#[tokio::test]
async fn system_restriction_beats_an_allow_policy() {
    let fixture = Fixture::new().await;
    let user_id = fixture.add_principal(Some(fixture.north), &[]).await;
    {
        let mut state = fixture.store.state.lock().await;
        state.policies.push(policy(
            fixture.tenant_id,
            "vip",
            PolicyTarget::User(user_id),
            PolicyEffect::Allow,
            10,
        ));
        state
            .restrictions
            .push(restriction(fixture.tenant_id, "*", RestrictionKind::KillSwitch));
    }

    let decision = fixture.check(user_id, "students", "read").await;

    assert_eq!(decision.result, AccessResult::Restricted);
    assert!(decision.reason.starts_with("restricted by system restriction"));
}

#[tokio::test]
async fn ip_allow_list_vetoes_unknown_and_foreign_addresses() {
    let fixture = Fixture::new().await;
    let manager = fixture
        .add_role(Some(fixture.tenant_id), "branch_manager", ScopeTag::Branch, None, &["students.read"])
        .await;
    let user_id = fixture.add_principal(Some(fixture.north), &[&manager]).await;
    let office = "10.0.0.0/8".parse().unwrap_or_else(|_| unreachable!());
    fixture.store.state.lock().await.restrictions.push(restriction(
        fixture.tenant_id,
        "students",
        RestrictionKind::IpAllowList {
            networks: vec![office],
        },
    ));

    let inside = RequestContext::now().with_ip_address(IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3)));
    let outside = RequestContext::now().with_ip_address(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)));

    assert!(fixture.check_with(user_id, "students", "read", &inside).await.allowed);
    assert_eq!(
        fixture
            .check_with(user_id, "students", "read", &outside)
            .await
            .result,
        AccessResult::Restricted
    );
    assert_eq!(
        fixture.check(user_id, "students", "read").await.result,
        AccessResult::Restricted
    );
}

#[tokio::test]
async fn highest_priority_matching_policy_is_terminal() {
    let fixture = Fixture::new().await;
    let manager = fixture
        .add_role(Some(fixture.tenant_id), "branch_manager", ScopeTag::Branch, None, &["students.*"])
        .await;
    let user_id = fixture.add_principal(Some(fixture.north), &[&manager]).await;
    {
        let mut state = fixture.store.state.lock().await;
        state.policies.push(policy(
            fixture.tenant_id,
            "allow-north",
            PolicyTarget::Branch(fixture.north),
            PolicyEffect::Allow,
            1,
        ));
        state.policies.push(policy(
            fixture.tenant_id,
            "freeze-managers",
            PolicyTarget::Role(manager.id()),
            PolicyEffect::Deny,
            5,
        ));
    }

    let decision = fixture.check(user_id, "students", "read").await;

    assert!(!decision.allowed);
    assert_eq!(decision.reason, "denied by policy 'freeze-managers'");
    assert_eq!(decision.applied_rules, vec!["policy:freeze-managers".to_owned()]);
}

#[tokio::test]
async fn explicit_user_denial_beats_role_grant() {
    let fixture = Fixture::new().await;
    let manager = fixture
        .add_role(Some(fixture.tenant_id), "branch_manager", ScopeTag::Branch, None, &["students.*"])
        .await;
    let user_id = fixture.add_principal(Some(fixture.north), &[&manager]).await;
    fixture
        .update_principal(user_id, |principal| {
            principal
                .permission_grants
                .push(user_grant("students.delete", AccessLevel::None));
        })
        .await;

    assert!(!fixture.check(user_id, "students", "delete").await.allowed);
    assert!(fixture.check(user_id, "students", "read").await.allowed);
}

#[tokio::test]
async fn direct_grant_without_roles_reaches_own_records() {
    let fixture = Fixture::new().await;
    let user_id = fixture.add_principal(Some(fixture.south), &[]).await;
    fixture
        .update_principal(user_id, |principal| {
            principal
                .permission_grants
                .push(user_grant("reports.read", AccessLevel::Read));
        })
        .await;

    let decision = fixture.check(user_id, "reports", "read").await;

    assert!(decision.allowed);
    assert_eq!(decision.access_level, Some(AccessLevel::Read));
    assert_eq!(decision.branch_scope, Some(ScopeTag::Own));
    assert_eq!(decision.data_filter, Some(DataFilter::eq("created_by", user_id)));
}

#[tokio::test]
async fn expired_grant_reports_expired() {
    let fixture = Fixture::new().await;
    let user_id = fixture.add_principal(Some(fixture.north), &[]).await;
    fixture
        .update_principal(user_id, |principal| {
            let mut grant = user_grant("billing.read", AccessLevel::Full);
            grant.expires_at = Some(Utc::now() - Duration::days(1));
            principal.permission_grants.push(grant);
        })
        .await;

    let decision = fixture.check(user_id, "billing", "read").await;

    assert!(!decision.allowed);
    assert_eq!(decision.result, AccessResult::Expired);
}

#[tokio::test]
async fn expired_assignment_reports_expired() {
    let fixture = Fixture::new().await;
    let consultant = fixture
        .add_role(Some(fixture.tenant_id), "consultant", ScopeTag::Assigned, None, &["students.read"])
        .await;
    let user_id = fixture.add_principal(Some(fixture.north), &[&consultant]).await;
    fixture
        .update_principal(user_id, |principal| {
            principal.role_assignments[0].expires_at = Some(Utc::now() - Duration::minutes(5));
        })
        .await;

    let decision = fixture.check(user_id, "students", "read").await;
    assert_eq!(decision.result, AccessResult::Expired);
}

#[tokio::test]
async fn conditional_grant_applies_only_when_conditions_hold() {
    let fixture = Fixture::new().await;
    let user_id = fixture.add_principal(Some(fixture.north), &[]).await;
    let north = fixture.north;
    fixture
        .update_principal(user_id, |principal| {
            let mut grant = user_grant("leads.read", AccessLevel::Limited);
            grant.conditions = ConditionSet::new(vec![
                Condition::new(
                    "request.branch_id",
                    ConditionOperator::Eq,
                    json!(north.to_string()),
                )
                .unwrap_or_else(|_| unreachable!()),
            ]);
            principal.permission_grants.push(grant);
        })
        .await;

    let mut at_north = RequestContext::now();
    at_north.branch_id = Some(fixture.north);
    let mut at_south = RequestContext::now();
    at_south.branch_id = Some(fixture.south);

    assert!(fixture.check_with(user_id, "leads", "read", &at_north).await.allowed);
    assert!(!fixture.check_with(user_id, "leads", "read", &at_south).await.allowed);
}

#[tokio::test]
async fn grants_are_inherited_across_two_levels() {
    let fixture = Fixture::new().await;
    let consultant = fixture
        .add_role(Some(fixture.tenant_id), "consultant", ScopeTag::Assigned, None, &["tasks.read"])
        .await;
    let manager = fixture
        .add_role(
            Some(fixture.tenant_id),
            "branch_manager",
            ScopeTag::Branch,
            Some(consultant.id()),
            &["leads.read"],
        )
        .await;
    let admin = fixture
        .add_role(
            Some(fixture.tenant_id),
            "agency_admin",
            ScopeTag::Agency,
            Some(manager.id()),
            &["roles.manage"],
        )
        .await;
    let manager_user = fixture.add_principal(Some(fixture.north), &[&manager]).await;
    let admin_user = fixture.add_principal(Some(fixture.north), &[&admin]).await;

    assert!(fixture.check(manager_user, "tasks", "read").await.allowed);
    assert!(!fixture.check(manager_user, "roles", "manage").await.allowed);
    assert!(fixture.check(admin_user, "tasks", "read").await.allowed);
    assert!(fixture.check(admin_user, "leads", "read").await.allowed);
}

#[tokio::test]
async fn role_cycle_denies_without_hanging() {
    let fixture = Fixture::new().await;
    let first_id = RoleId::new();
    let second = fixture
        .add_role(Some(fixture.tenant_id), "second", ScopeTag::Branch, Some(first_id), &["students.read"])
        .await;
    let first = fixture
        .add_role_with_id(
            first_id,
            Some(fixture.tenant_id),
            "first",
            ScopeTag::Branch,
            Some(second.id()),
            &["students.read"],
        )
        .await;
    let user_id = fixture.add_principal(Some(fixture.north), &[&first]).await;

    let decision = fixture.check(user_id, "students", "read").await;

    assert!(!decision.allowed);
    assert_eq!(decision.reason, "role hierarchy integrity violation");
}

#[tokio::test]
async fn foreign_tenant_records_need_a_global_system_role() {
    let fixture = Fixture::new().await;
    let other_tenant = TenantId::new();
    let other_branch = BranchId::new();
    fixture
        .store
        .state
        .lock()
        .await
        .branches
        .push(branch(other_tenant, other_branch, "abroad"));
    let foreign_student = fixture
        .add_student(other_tenant, Some(other_branch), None)
        .await;

    let admin = fixture
        .add_role(Some(fixture.tenant_id), "agency_admin", ScopeTag::Agency, None, &["students.*"])
        .await;
    let super_admin = fixture
        .add_role(None, "super_admin", ScopeTag::Global, None, &["*.*"])
        .await;
    let tenant_admin = fixture.add_principal(Some(fixture.north), &[&admin]).await;
    let operator = fixture.add_principal(None, &[&super_admin]).await;

    let denied = fixture.access(tenant_admin, &foreign_student).await;
    let allowed = fixture.access(operator, &foreign_student).await;

    assert_eq!(denied.reason, "tenant mismatch");
    assert!(allowed.allowed);
    assert_eq!(allowed.branch_scope, Some(ScopeTag::Global));
}

#[tokio::test]
async fn every_check_is_audited_once() {
    let fixture = Fixture::new().await;
    let consultant = fixture
        .add_role(Some(fixture.tenant_id), "consultant", ScopeTag::Assigned, None, &["students.read"])
        .await;
    let user_id = fixture.add_principal(Some(fixture.north), &[&consultant]).await;
    let student = fixture
        .add_student(fixture.tenant_id, Some(fixture.north), Some(user_id))
        .await;

    fixture.check(user_id, "students", "read").await;
    fixture.check(UserId::new(), "students", "read").await;
    fixture.access(user_id, &student).await;

    let state = fixture.store.state.lock().await;
    assert_eq!(state.access_entries.len(), 3);
    assert_eq!(state.access_entries[0].result, AccessResult::Allowed);
    assert_eq!(state.access_entries[1].tenant_id, None);
    assert_eq!(state.access_entries[2].resource_id.as_deref(), Some(student.as_str()));
    assert_eq!(
        state.access_entries[0].context["branch_scope"],
        json!("ASSIGNED")
    );
}

#[tokio::test]
async fn audit_failure_never_changes_the_decision() {
    let fixture = Fixture::new().await;
    let consultant = fixture
        .add_role(Some(fixture.tenant_id), "consultant", ScopeTag::Assigned, None, &["students.read"])
        .await;
    let user_id = fixture.add_principal(Some(fixture.north), &[&consultant]).await;
    fixture.store.state.lock().await.fail_audit = true;

    assert!(fixture.check(user_id, "students", "read").await.allowed);
}

#[tokio::test]
async fn store_failure_propagates_as_internal_error() {
    let fixture = Fixture::new().await;
    fixture.store.state.lock().await.fail_reads = true;
    let check = PermissionCheck::new("students", "read").unwrap_or_else(|_| unreachable!());

    let result = fixture
        .service
        .check_permission(UserId::new(), &check, &RequestContext::now())
        .await;

    assert!(matches!(result, Err(AppError::Internal(_))));
}

#[tokio::test]
async fn branch_rule_narrows_a_manager_to_one_office() {
    let fixture = Fixture::new().await;
    let manager = fixture
        .add_role(Some(fixture.tenant_id), "agency_admin", ScopeTag::Agency, None, &["students.read"])
        .await;
    let user_id = fixture.add_principal(Some(fixture.north), &[&manager]).await;
    fixture
        .store
        .state
        .lock()
        .await
        .branch_rules
        .push(scopegate_domain::BranchAccessRule {
            id: scopegate_core::BranchRuleId::new(),
            tenant_id: fixture.tenant_id,
            name: "south-only".to_owned(),
            role_id: Some(manager.id()),
            resource: Some("students".to_owned()),
            action: None,
            branch_ids: [fixture.south].into_iter().collect(),
            is_active: true,
        });

    let decision = fixture.check(user_id, "students", "read").await;

    assert!(decision.allowed);
    assert_eq!(
        decision.accessible_branches.into_iter().collect::<Vec<_>>(),
        vec![fixture.south]
    );
    assert!(decision.applied_rules.contains(&"branch_rule:south-only".to_owned()));
}

#[tokio::test]
async fn can_manage_role_compares_levels() {
    let fixture = Fixture::new().await;
    let consultant = fixture
        .add_role(Some(fixture.tenant_id), "consultant", ScopeTag::Assigned, None, &["students.read"])
        .await;
    let user_id = fixture.add_principal(Some(fixture.north), &[&consultant]).await;
    let peer = fixture
        .add_role(Some(fixture.tenant_id), "peer", ScopeTag::Assigned, None, &[])
        .await;

    let can_manage = fixture.service.can_manage_role(user_id, peer.id()).await;
    assert!(matches!(can_manage, Ok(false)));
}
