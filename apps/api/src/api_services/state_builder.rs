use std::sync::Arc;

use scopegate_application::{
    AuditRepository, AuthorizationService, CatalogService, SecurityAdminService,
};
use scopegate_domain::ResourcePolicyCatalog;
use scopegate_infrastructure::{
    PostgresAuditRepository, PostgresAuthorizationRepository, PostgresCatalogRepository,
    PostgresSecurityAdminRepository,
};
use sqlx::PgPool;

use crate::state::AppState;

pub fn build_app_state(pool: PgPool) -> AppState {
    let authorization_repository = Arc::new(PostgresAuthorizationRepository::new(pool.clone()));
    let audit_repository: Arc<dyn AuditRepository> =
        Arc::new(PostgresAuditRepository::new(pool.clone()));

    let authorization_service = AuthorizationService::new(
        authorization_repository.clone(),
        authorization_repository.clone(),
        authorization_repository,
        ResourcePolicyCatalog::education_agency_defaults(),
        audit_repository.clone(),
    );
    let catalog_service = CatalogService::new(
        Arc::new(PostgresCatalogRepository::new(pool.clone())),
        audit_repository.clone(),
    );
    let security_admin_service = SecurityAdminService::new(
        authorization_service.clone(),
        catalog_service.clone(),
        Arc::new(PostgresSecurityAdminRepository::new(pool)),
        audit_repository,
    );

    AppState {
        authorization_service,
        catalog_service,
        security_admin_service,
    }
}
