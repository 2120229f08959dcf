use scopegate_application::{AuthorizationService, CatalogService, SecurityAdminService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub catalog_service: CatalogService,
    pub security_admin_service: SecurityAdminService,
}
