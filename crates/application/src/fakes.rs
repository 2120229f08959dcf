//! In-process fakes shared by service tests.

use async_trait::async_trait;
use scopegate_core::{
    AppError, AppResult, AssignmentId, GrantId, RoleId, TenantId, UserId,
};
use scopegate_domain::{
    AccessPolicy, Branch, BranchAccessRule, Permission, Principal, ResourceInstance,
    ResourceRestriction, Role, RoleAssignment, UserPermissionGrant,
};
use tokio::sync::Mutex;

use crate::{
    AccessAuditEntry, AuditEvent, AuditRepository, AuthorizationRepository, BranchRepository,
    CatalogRepository, ResourceInstanceRepository, SecurityAdminRepository,
};

#[derive(Default)]
pub(crate) struct FakeState {
    pub(crate) principals: Vec<Principal>,
    pub(crate) roles: Vec<Role>,
    pub(crate) policies: Vec<AccessPolicy>,
    pub(crate) restrictions: Vec<ResourceRestriction>,
    pub(crate) branch_rules: Vec<BranchAccessRule>,
    pub(crate) branches: Vec<Branch>,
    pub(crate) instances: Vec<ResourceInstance>,
    pub(crate) permissions: Vec<Permission>,
    pub(crate) access_entries: Vec<AccessAuditEntry>,
    pub(crate) events: Vec<AuditEvent>,
    pub(crate) fail_audit: bool,
    pub(crate) fail_reads: bool,
}

#[derive(Default)]
pub(crate) struct FakeRbacStore {
    pub(crate) state: Mutex<FakeState>,
}

impl FakeRbacStore {
    fn check_reads(state: &FakeState) -> AppResult<()> {
        if state.fail_reads {
            return Err(AppError::Internal("store unavailable".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthorizationRepository for FakeRbacStore {
    async fn find_principal(&self, user_id: UserId) -> AppResult<Option<Principal>> {
        let state = self.state.lock().await;
        Self::check_reads(&state)?;
        Ok(state
            .principals
            .iter()
            .find(|principal| principal.id == user_id)
            .cloned())
    }

    async fn list_roles_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let state = self.state.lock().await;
        Self::check_reads(&state)?;
        Ok(state
            .roles
            .iter()
            .filter(|role| role.tenant_id().is_none_or(|owner| owner == tenant_id))
            .cloned()
            .collect())
    }

    async fn list_access_policies(&self, tenant_id: TenantId) -> AppResult<Vec<AccessPolicy>> {
        let state = self.state.lock().await;
        Ok(state
            .policies
            .iter()
            .filter(|policy| policy.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn list_resource_restrictions(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<ResourceRestriction>> {
        let state = self.state.lock().await;
        Ok(state
            .restrictions
            .iter()
            .filter(|restriction| restriction.tenant_id().is_none_or(|owner| owner == tenant_id))
            .cloned()
            .collect())
    }

    async fn list_branch_access_rules(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<BranchAccessRule>> {
        let state = self.state.lock().await;
        Ok(state
            .branch_rules
            .iter()
            .filter(|rule| rule.tenant_id == tenant_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BranchRepository for FakeRbacStore {
    async fn list_branches_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Branch>> {
        let state = self.state.lock().await;
        Ok(state
            .branches
            .iter()
            .filter(|branch| branch.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn list_all_branches(&self) -> AppResult<Vec<Branch>> {
        Ok(self.state.lock().await.branches.clone())
    }
}

#[async_trait]
impl ResourceInstanceRepository for FakeRbacStore {
    async fn find_resource_instance(
        &self,
        resource_type: &str,
        resource_id: &str,
    ) -> AppResult<Option<ResourceInstance>> {
        let state = self.state.lock().await;
        Ok(state
            .instances
            .iter()
            .find(|instance| instance.resource_type == resource_type && instance.id == resource_id)
            .cloned())
    }
}

#[async_trait]
impl AuditRepository for FakeRbacStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.state.lock().await.events.push(event);
        Ok(())
    }

    async fn append_access_entry(&self, entry: AccessAuditEntry) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.fail_audit {
            return Err(AppError::Internal("audit store offline".to_owned()));
        }
        state.access_entries.push(entry);
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for FakeRbacStore {
    async fn insert_permissions_if_absent(&self, permissions: &[Permission]) -> AppResult<usize> {
        let mut state = self.state.lock().await;
        let mut inserted = 0;
        for permission in permissions {
            if !state
                .permissions
                .iter()
                .any(|stored| stored.slug() == permission.slug())
            {
                state.permissions.push(permission.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        Ok(self.state.lock().await.permissions.clone())
    }

    async fn find_role_by_slug(
        &self,
        tenant_id: Option<TenantId>,
        slug: &str,
    ) -> AppResult<Option<Role>> {
        let state = self.state.lock().await;
        Ok(state
            .roles
            .iter()
            .find(|role| role.tenant_id() == tenant_id && role.slug() == slug)
            .cloned())
    }

    async fn insert_role_if_absent(&self, role: &Role) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        if state
            .roles
            .iter()
            .any(|stored| stored.tenant_id() == role.tenant_id() && stored.slug() == role.slug())
        {
            return Ok(false);
        }
        state.roles.push(role.clone());
        Ok(true)
    }
}

#[async_trait]
impl SecurityAdminRepository for FakeRbacStore {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        self.list_roles_for_tenant(tenant_id).await
    }

    async fn create_role(&self, role: Role) -> AppResult<Role> {
        if !self.insert_role_if_absent(&role).await? {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.slug()
            )));
        }
        Ok(role)
    }

    async fn update_role_parent(
        &self,
        role_id: RoleId,
        parent_role_id: Option<RoleId>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let role = state
            .roles
            .iter_mut()
            .find(|role| role.id() == role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;
        *role = role.clone().with_parent(parent_role_id);
        Ok(())
    }

    async fn create_role_assignment(&self, assignment: RoleAssignment) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let principal = state
            .principals
            .iter_mut()
            .find(|principal| principal.id == assignment.user_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("principal '{}' does not exist", assignment.user_id))
            })?;
        principal.role_assignments.push(assignment);
        Ok(())
    }

    async fn deactivate_role_assignment(
        &self,
        tenant_id: TenantId,
        assignment_id: AssignmentId,
    ) -> AppResult<RoleAssignment> {
        let mut state = self.state.lock().await;
        state
            .principals
            .iter_mut()
            .flat_map(|principal| principal.role_assignments.iter_mut())
            .find(|assignment| {
                assignment.assignment_id == assignment_id && assignment.tenant_id == tenant_id
            })
            .map(|assignment| {
                assignment.is_active = false;
                assignment.clone()
            })
            .ok_or_else(|| {
                AppError::NotFound(format!("assignment '{assignment_id}' does not exist"))
            })
    }

    async fn create_user_grant(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        grant: UserPermissionGrant,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let principal = state
            .principals
            .iter_mut()
            .find(|principal| principal.id == user_id && principal.tenant_id == tenant_id)
            .ok_or_else(|| AppError::NotFound(format!("principal '{user_id}' does not exist")))?;
        principal.permission_grants.push(grant);
        Ok(())
    }

    async fn revoke_user_grant(&self, tenant_id: TenantId, grant_id: GrantId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let grant = state
            .principals
            .iter_mut()
            .filter(|principal| principal.tenant_id == tenant_id)
            .flat_map(|principal| principal.permission_grants.iter_mut())
            .find(|grant| grant.grant_id == grant_id)
            .ok_or_else(|| AppError::NotFound(format!("grant '{grant_id}' does not exist")))?;
        grant.is_active = false;
        Ok(())
    }

    async fn create_restriction(&self, restriction: ResourceRestriction) -> AppResult<()> {
        self.state.lock().await.restrictions.push(restriction);
        Ok(())
    }

    async fn create_access_policy(&self, policy: AccessPolicy) -> AppResult<()> {
        self.state.lock().await.policies.push(policy);
        Ok(())
    }

    async fn create_branch_access_rule(&self, rule: BranchAccessRule) -> AppResult<()> {
        self.state.lock().await.branch_rules.push(rule);
        Ok(())
    }
}
