use std::sync::Arc;

use chrono::Utc;
use scopegate_application::{
    AuthorizationRepository, AuthorizationService, CatalogRepository, CatalogService,
    SecurityAdminRepository,
};
use scopegate_core::{AppError, AssignmentId, BranchId, GrantId, RestrictionId, RoleId, TenantId, UserId};
use scopegate_domain::{
    AccessLevel, AccessResult, Branch, ConditionSet, PermissionKey, Principal, PrincipalStatus,
    RequestContext, ResourceInstance, ResourcePolicyCatalog, ResourceRestriction,
    RestrictionInput, RestrictionKind, RestrictionScope, RoleAssignment, UserPermissionGrant,
};

use super::InMemoryRbacStore;

fn principal(tenant_id: TenantId, branch_id: Option<BranchId>) -> Principal {
    Principal {
        id: UserId::new(),
        tenant_id,
        branch_id,
        status: PrincipalStatus::Active,
        legacy_role: None,
        managed_branch_ids: Vec::new(),
        role_assignments: Vec::new(),
        permission_grants: Vec::new(),
    }
}

fn assignment(principal: &Principal, role_id: RoleId) -> RoleAssignment {
    RoleAssignment {
        assignment_id: AssignmentId::new(),
        user_id: principal.id,
        role_id,
        tenant_id: principal.tenant_id,
        branch_id: None,
        expires_at: None,
        assigned_by: None,
        is_active: true,
    }
}

fn authorization_service(store: &Arc<InMemoryRbacStore>) -> AuthorizationService {
    AuthorizationService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        ResourcePolicyCatalog::education_agency_defaults(),
        store.clone(),
    )
}

#[tokio::test]
async fn bootstrapped_consultant_reaches_only_assigned_students() {
    let store = Arc::new(InMemoryRbacStore::new());
    let catalog = CatalogService::new(store.clone(), store.clone());
    let tenant_id = TenantId::new();

    assert!(catalog.initialize_rbac().await.is_ok());
    assert!(catalog.bootstrap_tenant(tenant_id).await.is_ok());

    let Some(consultant_role) = store
        .find_role_by_slug(Some(tenant_id), "consultant")
        .await
        .unwrap_or_default()
    else {
        panic!("consultant role should be bootstrapped");
    };

    let branch = Branch {
        id: BranchId::new(),
        tenant_id,
        parent_branch_id: None,
        name: "Kathmandu".to_owned(),
    };
    store.save_branch(branch.clone()).await;

    let mut consultant = principal(tenant_id, Some(branch.id));
    consultant
        .role_assignments
        .push(assignment(&consultant, consultant_role.id()));
    store.save_principal(consultant.clone()).await;

    for (id, assigned_to) in [("student-1", Some(consultant.id)), ("student-2", None)] {
        store
            .save_resource_instance(ResourceInstance {
                resource_type: "students".to_owned(),
                id: id.to_owned(),
                tenant_id,
                branch_id: Some(branch.id),
                assigned_to,
                created_by: None,
            })
            .await;
    }

    let service = authorization_service(&store);
    let context = RequestContext::now();

    let assigned = service
        .can_access_resource(consultant.id, "students", "student-1", "read", &context)
        .await;
    assert!(assigned.is_ok());
    assert!(assigned.unwrap_or_else(|_| unreachable!()).allowed);

    let unassigned = service
        .can_access_resource(consultant.id, "students", "student-2", "read", &context)
        .await;
    assert!(unassigned.is_ok());
    assert!(!unassigned.unwrap_or_else(|_| unreachable!()).allowed);

    let entries = store.access_entries().await;
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry.tenant_id == Some(tenant_id)));
    assert_eq!(entries[0].resource_id.as_deref(), Some("student-1"));
}

#[tokio::test]
async fn global_restrictions_are_visible_to_every_tenant() {
    let store = Arc::new(InMemoryRbacStore::new());
    let tenant_id = TenantId::new();

    let global = ResourceRestriction::new(
        RestrictionId::new(),
        RestrictionInput {
            name: "maintenance".to_owned(),
            scope: RestrictionScope::Global,
            tenant_id: None,
            branch_id: None,
            resource: "*".to_owned(),
            kind: RestrictionKind::KillSwitch,
        },
    )
    .unwrap_or_else(|_| unreachable!());
    let foreign = ResourceRestriction::new(
        RestrictionId::new(),
        RestrictionInput {
            name: "other agency".to_owned(),
            scope: RestrictionScope::Agency,
            tenant_id: Some(TenantId::new()),
            branch_id: None,
            resource: "students".to_owned(),
            kind: RestrictionKind::KillSwitch,
        },
    )
    .unwrap_or_else(|_| unreachable!());

    assert!(store.create_restriction(global.clone()).await.is_ok());
    assert!(store.create_restriction(foreign).await.is_ok());

    let listed = store
        .list_resource_restrictions(tenant_id)
        .await
        .unwrap_or_default();
    assert_eq!(listed, vec![global]);

    let mut user = principal(tenant_id, None);
    user.legacy_role = Some("agency_admin".to_owned());
    store.save_principal(user.clone()).await;

    let catalog = CatalogService::new(store.clone(), store.clone());
    assert!(catalog.bootstrap_tenant(tenant_id).await.is_ok());

    let decision = authorization_service(&store)
        .check_permission(
            user.id,
            &scopegate_domain::PermissionCheck::new("students", "read")
                .unwrap_or_else(|_| unreachable!()),
            &RequestContext::now(),
        )
        .await;
    assert!(decision.is_ok());
    assert_eq!(
        decision.unwrap_or_else(|_| unreachable!()).result,
        AccessResult::Restricted
    );
}

#[tokio::test]
async fn admin_writes_respect_tenant_boundaries() {
    let store = InMemoryRbacStore::new();
    let tenant_id = TenantId::new();
    let user = principal(tenant_id, None);
    store.save_principal(user.clone()).await;

    let grant = UserPermissionGrant {
        grant_id: GrantId::new(),
        permission: PermissionKey::from_slug("invoices.read").unwrap_or_else(|_| unreachable!()),
        access_level: AccessLevel::Read,
        conditions: ConditionSet::always(),
        expires_at: None,
        is_active: true,
    };

    let cross_tenant = store
        .create_user_grant(TenantId::new(), user.id, grant.clone())
        .await;
    assert!(matches!(cross_tenant, Err(AppError::NotFound(_))));

    assert!(
        store
            .create_user_grant(tenant_id, user.id, grant.clone())
            .await
            .is_ok()
    );
    let foreign_revoke = store.revoke_user_grant(TenantId::new(), grant.grant_id).await;
    assert!(matches!(foreign_revoke, Err(AppError::NotFound(_))));
    assert!(store.revoke_user_grant(tenant_id, grant.grant_id).await.is_ok());

    let stored = store.find_principal(user.id).await.unwrap_or_default();
    let Some(stored) = stored else {
        panic!("principal should exist");
    };
    assert!(!stored.permission_grants[0].is_active);

    let unknown_role = store
        .create_role_assignment(assignment(&stored, RoleId::new()))
        .await;
    assert!(matches!(unknown_role, Err(AppError::NotFound(_))));

    let missing = store
        .deactivate_role_assignment(tenant_id, AssignmentId::new())
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let reparent = store.update_role_parent(RoleId::new(), None).await;
    assert!(matches!(reparent, Err(AppError::NotFound(_))));
    assert!(stored.effective_assignments(Utc::now()).next().is_none());
}
