use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use scopegate_application::{
    AssignRoleInput, CreateAccessPolicyInput, CreateBranchAccessRuleInput, CreateRestrictionInput,
    CreateRoleInput, GrantUserPermissionInput,
};
use scopegate_core::{AssignmentId, GrantId, RoleId, TenantId, UserId};
use scopegate_domain::{AccessPolicy, BranchAccessRule, RequestContext, ResourceRestriction};

use crate::dto::{
    AssignRoleRequest, BootstrapSummaryResponse, CreateAccessPolicyRequest,
    CreateBranchAccessRuleRequest, CreateRestrictionRequest, CreateRoleRequest,
    GrantUserPermissionRequest, ReparentRoleRequest, RoleAssignmentResponse, RoleResponse,
    UserGrantResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod governance;
mod grants;
mod roles;

pub use governance::{
    bootstrap_tenant_handler, create_access_policy_handler, create_branch_access_rule_handler,
    create_restriction_handler,
};
pub use grants::{grant_user_permission_handler, revoke_user_grant_handler};
pub use roles::{
    assign_role_handler, create_role_handler, list_roles_handler, reparent_role_handler,
    unassign_role_handler,
};
