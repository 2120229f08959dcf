use async_trait::async_trait;

use scopegate_core::{AppResult, TenantId, UserId};
use scopegate_domain::{
    AccessPolicy, Branch, BranchAccessRule, Principal, ResourceInstance, ResourceRestriction, Role,
};

/// Repository port for the authorization read model.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Finds a principal with its assignments and direct grants loaded.
    async fn find_principal(&self, user_id: UserId) -> AppResult<Option<Principal>>;

    /// Lists the tenant's roles together with every system role.
    async fn list_roles_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Role>>;

    /// Lists the tenant's access policies.
    async fn list_access_policies(&self, tenant_id: TenantId) -> AppResult<Vec<AccessPolicy>>;

    /// Lists restrictions bound to the tenant together with global ones.
    async fn list_resource_restrictions(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<ResourceRestriction>>;

    /// Lists the tenant's branch access rules.
    async fn list_branch_access_rules(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<BranchAccessRule>>;
}

/// Repository port for the branch tree.
#[async_trait]
pub trait BranchRepository: Send + Sync {
    /// Lists branches owned by one tenant.
    async fn list_branches_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Branch>>;

    /// Lists every branch in the installation.
    async fn list_all_branches(&self) -> AppResult<Vec<Branch>>;
}

/// Repository port for ownership projections of business records.
#[async_trait]
pub trait ResourceInstanceRepository: Send + Sync {
    /// Finds one resource instance by type and id.
    async fn find_resource_instance(
        &self,
        resource_type: &str,
        resource_id: &str,
    ) -> AppResult<Option<ResourceInstance>>;
}
