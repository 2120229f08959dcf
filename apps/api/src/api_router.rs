use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{delete, get, post, put};
use scopegate_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

pub fn build_router(app_state: AppState, frontend_url: Option<&str>) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/authorization/check",
            post(handlers::authorization::check_permission_handler),
        )
        .route(
            "/api/authorization/resource-access",
            post(handlers::authorization::resource_access_handler),
        )
        .route(
            "/api/authorization/accessible-branches",
            post(handlers::authorization::accessible_branches_handler),
        )
        .route(
            "/api/security/roles",
            get(handlers::security::list_roles_handler)
                .post(handlers::security::create_role_handler),
        )
        .route(
            "/api/security/roles/{role_id}/parent",
            put(handlers::security::reparent_role_handler),
        )
        .route(
            "/api/security/role-assignments",
            post(handlers::security::assign_role_handler),
        )
        .route(
            "/api/security/role-assignments/{assignment_id}",
            delete(handlers::security::unassign_role_handler),
        )
        .route(
            "/api/security/user-grants",
            post(handlers::security::grant_user_permission_handler),
        )
        .route(
            "/api/security/user-grants/{grant_id}",
            delete(handlers::security::revoke_user_grant_handler),
        )
        .route(
            "/api/security/restrictions",
            post(handlers::security::create_restriction_handler),
        )
        .route(
            "/api/security/policies",
            post(handlers::security::create_access_policy_handler),
        )
        .route(
            "/api/security/branch-rules",
            post(handlers::security::create_branch_access_rule_handler),
        )
        .route(
            "/api/security/tenants/{tenant_id}/bootstrap",
            post(handlers::security::bootstrap_tenant_handler),
        )
        .route_layer(from_fn(middleware::require_principal));

    let mut app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http());

    if let Some(frontend_url) = frontend_url {
        app = app.layer(cors::build_cors_layer(frontend_url)?);
    }

    Ok(app.with_state(app_state))
}
