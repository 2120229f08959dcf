use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;

use scopegate_core::UserId;
use scopegate_domain::{AccessDecision, PermissionCheck, RequestContext};

use crate::dto::{
    AccessibleBranchesRequest, AccessibleBranchesResponse, PermissionCheckRequest,
    ResourceAccessRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn check_permission_handler(
    State(state): State<AppState>,
    Extension(principal_id): Extension<UserId>,
    Extension(context): Extension<RequestContext>,
    Json(payload): Json<PermissionCheckRequest>,
) -> ApiResult<(StatusCode, Json<AccessDecision>)> {
    let check = PermissionCheck::new(payload.resource, payload.action)?;
    let decision = state
        .authorization_service
        .check_permission(principal_id, &check, &context)
        .await?;

    Ok(decision_response(decision))
}

pub async fn resource_access_handler(
    State(state): State<AppState>,
    Extension(principal_id): Extension<UserId>,
    Extension(context): Extension<RequestContext>,
    Json(payload): Json<ResourceAccessRequest>,
) -> ApiResult<(StatusCode, Json<AccessDecision>)> {
    let decision = state
        .authorization_service
        .can_access_resource(
            principal_id,
            payload.resource_type.as_str(),
            payload.resource_id.as_str(),
            payload.action.as_str(),
            &context,
        )
        .await?;

    Ok(decision_response(decision))
}

pub async fn accessible_branches_handler(
    State(state): State<AppState>,
    Extension(principal_id): Extension<UserId>,
    Json(payload): Json<AccessibleBranchesRequest>,
) -> ApiResult<Json<AccessibleBranchesResponse>> {
    let resolution = state
        .authorization_service
        .resolve_accessible_branches(principal_id, payload.resource_type.as_str(), payload.scope)
        .await?;

    Ok(Json(AccessibleBranchesResponse::from(resolution)))
}

/// Denied decisions travel as 403 with the full decision body.
/// Unknown principals answer 401 like a missing principal header.
fn decision_response(decision: AccessDecision) -> (StatusCode, Json<AccessDecision>) {
    let status = if decision.allowed {
        StatusCode::OK
    } else if decision.is_unknown_principal() {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::FORBIDDEN
    };
    (status, Json(decision))
}
