use std::sync::Arc;

use scopegate_core::{AppError, AppResult, TenantId, UserId};
use scopegate_domain::{AdminPermission, AuditAction, Principal, RequestContext};

use crate::access_audit::AuditLogger;
use crate::role_graph::RoleGraph;
use crate::{
    AuditEvent, AuditRepository, AuthorizationService, CatalogService, SecurityAdminRepository,
};

/// Application service for role, grant and governance administration.
///
/// Every write checks an admin permission through [`AuthorizationService`]
/// and records an audit event attributed to the acting principal.
#[derive(Clone)]
pub struct SecurityAdminService {
    authorization_service: AuthorizationService,
    catalog_service: CatalogService,
    repository: Arc<dyn SecurityAdminRepository>,
    audit_logger: AuditLogger,
}

impl SecurityAdminService {
    /// Creates a new security admin service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        catalog_service: CatalogService,
        repository: Arc<dyn SecurityAdminRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            catalog_service,
            repository,
            audit_logger: AuditLogger::new(audit_repository),
        }
    }

    async fn require(
        &self,
        actor: UserId,
        permission: AdminPermission,
        context: &RequestContext,
    ) -> AppResult<Principal> {
        self.authorization_service
            .require_permission(actor, permission, context)
            .await
    }

    async fn tenant_graph(&self, tenant_id: TenantId) -> AppResult<RoleGraph> {
        Ok(RoleGraph::new(self.repository.list_roles(tenant_id).await?))
    }

    async fn record(
        &self,
        actor: &Principal,
        action: AuditAction,
        resource_type: &str,
        resource_id: String,
        detail: String,
    ) {
        self.audit_logger
            .log_event(AuditEvent {
                tenant_id: actor.tenant_id,
                subject: actor.id.to_string(),
                action,
                resource_type: resource_type.to_owned(),
                resource_id,
                detail: Some(detail),
            })
            .await;
    }
}

fn forbidden(actor: &Principal, message: impl std::fmt::Display) -> AppError {
    AppError::Forbidden(format!("principal '{}' {message}", actor.id))
}

mod governance;
mod grants;
mod roles;
