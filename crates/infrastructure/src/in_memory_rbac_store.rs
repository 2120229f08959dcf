use async_trait::async_trait;
use scopegate_application::{
    AccessAuditEntry, AuditEvent, AuditRepository, AuthorizationRepository, BranchRepository,
    CatalogRepository, ResourceInstanceRepository, SecurityAdminRepository,
};
use scopegate_core::{AppError, AppResult, AssignmentId, GrantId, RoleId, TenantId, UserId};
use scopegate_domain::{
    AccessPolicy, Branch, BranchAccessRule, Permission, Principal, ResourceInstance,
    ResourceRestriction, Role, RoleAssignment, UserPermissionGrant,
};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct RbacTables {
    principals: Vec<Principal>,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    policies: Vec<AccessPolicy>,
    restrictions: Vec<ResourceRestriction>,
    branch_rules: Vec<BranchAccessRule>,
    branches: Vec<Branch>,
    instances: Vec<ResourceInstance>,
    events: Vec<AuditEvent>,
    access_entries: Vec<AccessAuditEntry>,
}

impl RbacTables {
    fn slug_taken(&self, role: &Role) -> bool {
        self.roles
            .iter()
            .any(|stored| stored.tenant_id() == role.tenant_id() && stored.slug() == role.slug())
    }
}

/// In-memory implementation of every RBAC port.
///
/// All tables sit behind one lock so insert-if-absent is atomic.
#[derive(Debug, Default)]
pub struct InMemoryRbacStore {
    tables: RwLock<RbacTables>,
}

impl InMemoryRbacStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or replaces a principal.
    pub async fn save_principal(&self, principal: Principal) {
        let mut tables = self.tables.write().await;
        tables.principals.retain(|stored| stored.id != principal.id);
        tables.principals.push(principal);
    }

    /// Stores a branch.
    pub async fn save_branch(&self, branch: Branch) {
        self.tables.write().await.branches.push(branch);
    }

    /// Stores or replaces a resource instance.
    pub async fn save_resource_instance(&self, instance: ResourceInstance) {
        let mut tables = self.tables.write().await;
        tables.instances.retain(|stored| {
            stored.resource_type != instance.resource_type || stored.id != instance.id
        });
        tables.instances.push(instance);
    }

    /// Returns recorded access decisions, oldest first.
    pub async fn access_entries(&self) -> Vec<AccessAuditEntry> {
        self.tables.read().await.access_entries.clone()
    }

    /// Returns recorded admin events, oldest first.
    pub async fn audit_events(&self) -> Vec<AuditEvent> {
        self.tables.read().await.events.clone()
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryRbacStore {
    async fn find_principal(&self, user_id: UserId) -> AppResult<Option<Principal>> {
        let tables = self.tables.read().await;
        Ok(tables
            .principals
            .iter()
            .find(|principal| principal.id == user_id)
            .cloned())
    }

    async fn list_roles_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let tables = self.tables.read().await;
        Ok(tables
            .roles
            .iter()
            .filter(|role| role.tenant_id().is_none_or(|owner| owner == tenant_id))
            .cloned()
            .collect())
    }

    async fn list_access_policies(&self, tenant_id: TenantId) -> AppResult<Vec<AccessPolicy>> {
        let tables = self.tables.read().await;
        Ok(tables
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
        let tables = self.tables.read().await;
        Ok(tables
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
        let tables = self.tables.read().await;
        Ok(tables
            .branch_rules
            .iter()
            .filter(|rule| rule.tenant_id == tenant_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BranchRepository for InMemoryRbacStore {
    async fn list_branches_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Branch>> {
        let tables = self.tables.read().await;
        Ok(tables
            .branches
            .iter()
            .filter(|branch| branch.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn list_all_branches(&self) -> AppResult<Vec<Branch>> {
        Ok(self.tables.read().await.branches.clone())
    }
}

#[async_trait]
impl ResourceInstanceRepository for InMemoryRbacStore {
    async fn find_resource_instance(
        &self,
        resource_type: &str,
        resource_id: &str,
    ) -> AppResult<Option<ResourceInstance>> {
        let tables = self.tables.read().await;
        Ok(tables
            .instances
            .iter()
            .find(|instance| instance.resource_type == resource_type && instance.id == resource_id)
            .cloned())
    }
}

#[async_trait]
impl AuditRepository for InMemoryRbacStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.tables.write().await.events.push(event);
        Ok(())
    }

    async fn append_access_entry(&self, entry: AccessAuditEntry) -> AppResult<()> {
        self.tables.write().await.access_entries.push(entry);
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryRbacStore {
    async fn insert_permissions_if_absent(&self, permissions: &[Permission]) -> AppResult<usize> {
        let mut tables = self.tables.write().await;
        let mut inserted = 0;

        for permission in permissions {
            if tables
                .permissions
                .iter()
                .all(|stored| stored.key() != permission.key())
            {
                tables.permissions.push(permission.clone());
                inserted += 1;
            }
        }

        Ok(inserted)
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        Ok(self.tables.read().await.permissions.clone())
    }

    async fn find_role_by_slug(
        &self,
        tenant_id: Option<TenantId>,
        slug: &str,
    ) -> AppResult<Option<Role>> {
        let tables = self.tables.read().await;
        Ok(tables
            .roles
            .iter()
            .find(|role| role.tenant_id() == tenant_id && role.slug() == slug)
            .cloned())
    }

    async fn insert_role_if_absent(&self, role: &Role) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(role) {
            return Ok(false);
        }
        tables.roles.push(role.clone());
        Ok(true)
    }
}

#[async_trait]
impl SecurityAdminRepository for InMemoryRbacStore {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        self.list_roles_for_tenant(tenant_id).await
    }

    async fn create_role(&self, role: Role) -> AppResult<Role> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(&role) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.slug()
            )));
        }
        tables.roles.push(role.clone());
        Ok(role)
    }

    async fn update_role_parent(
        &self,
        role_id: RoleId,
        parent_role_id: Option<RoleId>,
    ) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let role = tables
            .roles
            .iter_mut()
            .find(|role| role.id() == role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;
        *role = role.clone().with_parent(parent_role_id);
        Ok(())
    }

    async fn create_role_assignment(&self, assignment: RoleAssignment) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.roles.iter().any(|role| role.id() == assignment.role_id) {
            return Err(AppError::NotFound(format!(
                "role '{}' does not exist",
                assignment.role_id
            )));
        }
        let principal = tables
            .principals
            .iter_mut()
            .find(|principal| {
                principal.id == assignment.user_id && principal.tenant_id == assignment.tenant_id
            })
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
        let mut tables = self.tables.write().await;
        let assignment = tables
            .principals
            .iter_mut()
            .flat_map(|principal| principal.role_assignments.iter_mut())
            .find(|assignment| {
                assignment.assignment_id == assignment_id && assignment.tenant_id == tenant_id
            })
            .ok_or_else(|| {
                AppError::NotFound(format!("assignment '{assignment_id}' does not exist"))
            })?;
        assignment.is_active = false;
        Ok(assignment.clone())
    }

    async fn create_user_grant(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        grant: UserPermissionGrant,
    ) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let principal = tables
            .principals
            .iter_mut()
            .find(|principal| principal.id == user_id && principal.tenant_id == tenant_id)
            .ok_or_else(|| AppError::NotFound(format!("principal '{user_id}' does not exist")))?;
        principal.permission_grants.push(grant);
        Ok(())
    }

    async fn revoke_user_grant(&self, tenant_id: TenantId, grant_id: GrantId) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let grant = tables
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
        self.tables.write().await.restrictions.push(restriction);
        Ok(())
    }

    async fn create_access_policy(&self, policy: AccessPolicy) -> AppResult<()> {
        self.tables.write().await.policies.push(policy);
        Ok(())
    }

    async fn create_branch_access_rule(&self, rule: BranchAccessRule) -> AppResult<()> {
        self.tables.write().await.branch_rules.push(rule);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
