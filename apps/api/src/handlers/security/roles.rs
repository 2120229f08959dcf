use super::*;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserId>,
    Extension(context): Extension<RequestContext>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .security_admin_service
        .list_roles(actor, &context)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserId>,
    Extension(context): Extension<RequestContext>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let input = CreateRoleInput::try_from(payload)?;
    let role = state
        .security_admin_service
        .create_role(actor, input, &context)
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn reparent_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserId>,
    Extension(context): Extension<RequestContext>,
    Path(role_id): Path<String>,
    Json(payload): Json<ReparentRoleRequest>,
) -> ApiResult<StatusCode> {
    let role_id = RoleId::parse(role_id.as_str())?;
    state
        .security_admin_service
        .reparent_role(actor, role_id, payload.parent_role_id, &context)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserId>,
    Extension(context): Extension<RequestContext>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleAssignmentResponse>)> {
    let assignment = state
        .security_admin_service
        .assign_role(
            actor,
            AssignRoleInput {
                user_id: payload.user_id,
                role_id: payload.role_id,
                branch_id: payload.branch_id,
                expires_at: payload.expires_at,
            },
            &context,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RoleAssignmentResponse::from(assignment)),
    ))
}

pub async fn unassign_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserId>,
    Extension(context): Extension<RequestContext>,
    Path(assignment_id): Path<String>,
) -> ApiResult<Json<RoleAssignmentResponse>> {
    let assignment_id = AssignmentId::parse(assignment_id.as_str())?;
    let assignment = state
        .security_admin_service
        .unassign_role(actor, assignment_id, &context)
        .await?;

    Ok(Json(RoleAssignmentResponse::from(assignment)))
}
