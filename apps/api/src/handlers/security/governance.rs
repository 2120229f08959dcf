use super::*;

pub async fn create_restriction_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserId>,
    Extension(context): Extension<RequestContext>,
    Json(payload): Json<CreateRestrictionRequest>,
) -> ApiResult<(StatusCode, Json<ResourceRestriction>)> {
    let restriction = state
        .security_admin_service
        .create_restriction(actor, CreateRestrictionInput::from(payload), &context)
        .await?;

    Ok((StatusCode::CREATED, Json(restriction)))
}

pub async fn create_access_policy_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserId>,
    Extension(context): Extension<RequestContext>,
    Json(payload): Json<CreateAccessPolicyRequest>,
) -> ApiResult<(StatusCode, Json<AccessPolicy>)> {
    let policy = state
        .security_admin_service
        .create_access_policy(actor, CreateAccessPolicyInput::from(payload), &context)
        .await?;

    Ok((StatusCode::CREATED, Json(policy)))
}

pub async fn create_branch_access_rule_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserId>,
    Extension(context): Extension<RequestContext>,
    Json(payload): Json<CreateBranchAccessRuleRequest>,
) -> ApiResult<(StatusCode, Json<BranchAccessRule>)> {
    let rule = state
        .security_admin_service
        .create_branch_access_rule(actor, CreateBranchAccessRuleInput::from(payload), &context)
        .await?;

    Ok((StatusCode::CREATED, Json(rule)))
}

/// Seeds the default catalog roles into a tenant. Restricted to system roles.
pub async fn bootstrap_tenant_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<UserId>,
    Extension(context): Extension<RequestContext>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<BootstrapSummaryResponse>> {
    let tenant_id = TenantId::parse(tenant_id.as_str())?;
    let summary = state
        .security_admin_service
        .bootstrap_tenant(actor, tenant_id, &context)
        .await?;

    Ok(Json(BootstrapSummaryResponse::from(summary)))
}
