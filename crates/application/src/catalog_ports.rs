use async_trait::async_trait;

use scopegate_core::{AppResult, TenantId};
use scopegate_domain::{Permission, Role};

/// Repository port for the permission catalog and built-in roles.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Inserts permissions whose slug is not yet stored and returns how many were new.
    async fn insert_permissions_if_absent(&self, permissions: &[Permission]) -> AppResult<usize>;

    /// Lists the stored permission catalog.
    async fn list_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Finds a role by slug; `None` tenant looks up system roles.
    async fn find_role_by_slug(
        &self,
        tenant_id: Option<TenantId>,
        slug: &str,
    ) -> AppResult<Option<Role>>;

    /// Inserts a role with its grants unless the slug already exists in its tenant.
    ///
    /// Returns `true` when the role was inserted.
    async fn insert_role_if_absent(&self, role: &Role) -> AppResult<bool>;
}
