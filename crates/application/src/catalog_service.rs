use std::collections::HashMap;
use std::sync::Arc;

use scopegate_core::{AppError, AppResult, RoleId, TenantId};
use scopegate_domain::{
    AuditAction, Permission, RoleTemplate, list_default_permissions, list_default_role_templates,
};

use crate::access_audit::AuditLogger;
use crate::{AuditEvent, AuditRepository, CatalogRepository};

const SYSTEM_SUBJECT: &str = "system";

/// Counts of catalog rows created by one bootstrap call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogBootstrapSummary {
    /// Permissions inserted by this call.
    pub permissions_created: usize,
    /// Role slugs inserted by this call.
    pub roles_created: Vec<String>,
}

/// Application service seeding the permission catalog and built-in roles.
#[derive(Clone)]
pub struct CatalogService {
    repository: Arc<dyn CatalogRepository>,
    audit_logger: AuditLogger,
}

impl CatalogService {
    /// Creates a new catalog service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn CatalogRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            repository,
            audit_logger: AuditLogger::new(audit_repository),
        }
    }

    /// Returns the built-in permission catalog.
    pub fn list_default_permissions(&self) -> AppResult<Vec<Permission>> {
        list_default_permissions()
    }

    /// Returns the built-in role templates, parents first.
    #[must_use]
    pub fn list_default_role_templates(&self) -> &'static [RoleTemplate] {
        list_default_role_templates()
    }

    /// Seeds the permission catalog and the system roles. Safe to call on every start.
    pub async fn initialize_rbac(&self) -> AppResult<CatalogBootstrapSummary> {
        let permissions_created = self.seed_permissions().await?;
        let roles_created = self
            .seed_templates(None, |template| template.is_system)
            .await?;

        tracing::info!(
            permissions_created,
            roles_created = roles_created.len(),
            "rbac catalog initialized"
        );

        Ok(CatalogBootstrapSummary {
            permissions_created,
            roles_created,
        })
    }

    /// Seeds the catalog and a tenant's default roles. Existing roles are left untouched.
    pub async fn bootstrap_tenant(&self, tenant_id: TenantId) -> AppResult<CatalogBootstrapSummary> {
        let permissions_created = self.seed_permissions().await?;
        let roles_created = self
            .seed_templates(Some(tenant_id), |template| !template.is_system)
            .await?;

        if !roles_created.is_empty() {
            self.audit_logger
                .log_event(AuditEvent {
                    tenant_id,
                    subject: SYSTEM_SUBJECT.to_owned(),
                    action: AuditAction::SecurityTenantBootstrapped,
                    resource_type: "rbac_tenant".to_owned(),
                    resource_id: tenant_id.to_string(),
                    detail: Some(format!("created default roles: {}", roles_created.join(", "))),
                })
                .await;
        }

        tracing::info!(
            %tenant_id,
            permissions_created,
            roles_created = roles_created.len(),
            "tenant rbac bootstrapped"
        );

        Ok(CatalogBootstrapSummary {
            permissions_created,
            roles_created,
        })
    }

    async fn seed_permissions(&self) -> AppResult<usize> {
        let permissions = list_default_permissions()?;
        self.repository
            .insert_permissions_if_absent(&permissions)
            .await
    }

    async fn seed_templates(
        &self,
        tenant_id: Option<TenantId>,
        include: impl Fn(&RoleTemplate) -> bool,
    ) -> AppResult<Vec<String>> {
        let mut resolved: HashMap<&str, RoleId> = HashMap::new();
        let mut created = Vec::new();

        for template in list_default_role_templates()
            .iter()
            .filter(|template| include(template))
        {
            let parent_role_id = match template.parent_slug {
                Some(parent_slug) => Some(resolved.get(parent_slug).copied().ok_or_else(|| {
                    AppError::Internal(format!(
                        "role template '{}' is listed before its parent '{parent_slug}'",
                        template.slug
                    ))
                })?),
                None => None,
            };

            let role = template.to_role(RoleId::new(), tenant_id, parent_role_id)?;
            if self.repository.insert_role_if_absent(&role).await? {
                created.push(template.slug.to_owned());
            }

            let stored = self
                .repository
                .find_role_by_slug(tenant_id, template.slug)
                .await?
                .ok_or_else(|| {
                    AppError::Internal(format!(
                        "role '{}' missing right after bootstrap insert",
                        template.slug
                    ))
                })?;
            resolved.insert(template.slug, stored.id());
        }

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use scopegate_core::TenantId;
    use scopegate_domain::AuditAction;

    use super::CatalogService;
    use crate::fakes::FakeRbacStore;

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let store = Arc::new(FakeRbacStore::default());
        let service = CatalogService::new(store.clone(), store.clone());
        let tenant_id = TenantId::new();

        let first = service.bootstrap_tenant(tenant_id).await;
        let second = service.bootstrap_tenant(tenant_id).await;

        let first = first.unwrap_or_default();
        let second = second.unwrap_or_default();
        assert!(first.permissions_created > 0);
        assert_eq!(first.roles_created.len(), 6);
        assert_eq!(second.permissions_created, 0);
        assert!(second.roles_created.is_empty());

        let state = store.state.lock().await;
        assert_eq!(state.roles.len(), 6);
        assert_eq!(state.events.len(), 1);
        assert_eq!(state.events[0].action, AuditAction::SecurityTenantBootstrapped);
    }

    #[tokio::test]
    async fn bootstrap_links_parents_to_stored_roles() {
        let store = Arc::new(FakeRbacStore::default());
        let service = CatalogService::new(store.clone(), store.clone());
        let tenant_id = TenantId::new();

        assert!(service.bootstrap_tenant(tenant_id).await.is_ok());

        let state = store.state.lock().await;
        let consultant = state.roles.iter().find(|role| role.slug() == "consultant");
        let manager = state.roles.iter().find(|role| role.slug() == "branch_manager");
        assert!(consultant.is_some());
        assert_eq!(
            manager.and_then(|role| role.parent_role_id()),
            consultant.map(|role| role.id())
        );
    }

    #[tokio::test]
    async fn initialize_creates_only_the_system_role() {
        let store = Arc::new(FakeRbacStore::default());
        let service = CatalogService::new(store.clone(), store.clone());

        let summary = service.initialize_rbac().await.unwrap_or_default();
        let again = service.initialize_rbac().await.unwrap_or_default();

        assert_eq!(summary.roles_created, vec!["super_admin".to_owned()]);
        assert!(again.roles_created.is_empty());
        let state = store.state.lock().await;
        assert!(state.roles.iter().all(|role| role.is_system()));
    }

    #[tokio::test]
    async fn tenants_get_independent_role_sets() {
        let store = Arc::new(FakeRbacStore::default());
        let service = CatalogService::new(store.clone(), store.clone());

        assert!(service.bootstrap_tenant(TenantId::new()).await.is_ok());
        assert!(service.bootstrap_tenant(TenantId::new()).await.is_ok());

        assert_eq!(store.state.lock().await.roles.len(), 12);
    }
}
