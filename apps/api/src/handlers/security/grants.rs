use super::*;

pub async fn grant_user_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserId>,
    Extension(context): Extension<RequestContext>,
    Json(payload): Json<GrantUserPermissionRequest>,
) -> ApiResult<(StatusCode, Json<UserGrantResponse>)> {
    let input = GrantUserPermissionInput::try_from(payload)?;
    let grant = state
        .security_admin_service
        .grant_user_permission(actor, input, &context)
        .await?;

    Ok((StatusCode::CREATED, Json(UserGrantResponse::from(grant))))
}

pub async fn revoke_user_grant_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserId>,
    Extension(context): Extension<RequestContext>,
    Path(grant_id): Path<String>,
) -> ApiResult<StatusCode> {
    let grant_id = GrantId::parse(grant_id.as_str())?;
    state
        .security_admin_service
        .revoke_user_grant(actor, grant_id, &context)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
