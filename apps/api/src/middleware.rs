use std::net::IpAddr;

use axum::extract::Request;
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use scopegate_core::{AppError, AppResult, BranchId, TenantId, UserId};
use scopegate_domain::RequestContext;

use crate::error::ApiResult;

/// Header carrying the authenticated principal, set by the upstream gateway.
pub const PRINCIPAL_HEADER: &str = "x-principal-id";
const AGENCY_HEADER: &str = "x-agency-id";
const BRANCH_HEADER: &str = "x-branch-id";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Resolves the calling principal and request context into request extensions.
pub async fn require_principal(mut request: Request, next: Next) -> ApiResult<Response> {
    let principal_id = principal_from_headers(request.headers())?;
    let context = request_context(request.headers())?;

    request.extensions_mut().insert(principal_id);
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

pub fn principal_from_headers(headers: &HeaderMap) -> AppResult<UserId> {
    let value = headers
        .get(PRINCIPAL_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    UserId::parse(value)
        .map_err(|_| AppError::Unauthorized("invalid principal identifier".to_owned()))
}

pub fn request_context(headers: &HeaderMap) -> AppResult<RequestContext> {
    let mut context = RequestContext::now();

    context.agency_id = header_str(headers, AGENCY_HEADER)
        .map(TenantId::parse)
        .transpose()?;
    context.branch_id = header_str(headers, BRANCH_HEADER)
        .map(BranchId::parse)
        .transpose()?;
    context.ip_address = header_str(headers, FORWARDED_FOR_HEADER)
        .and_then(|value| value.split(',').next())
        .and_then(|value| value.trim().parse::<IpAddr>().ok());
    context.user_agent = header_str(headers, header::USER_AGENT.as_str()).map(str::to_owned);

    Ok(context)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
