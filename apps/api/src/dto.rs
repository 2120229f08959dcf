mod authorization;
mod common;
mod security;

pub use authorization::{
    AccessibleBranchesRequest, AccessibleBranchesResponse, PermissionCheckRequest,
    ResourceAccessRequest,
};
pub use common::HealthResponse;
pub use security::{
    AssignRoleRequest, BootstrapSummaryResponse, CreateAccessPolicyRequest,
    CreateBranchAccessRuleRequest, CreateRestrictionRequest, CreateRoleRequest,
    GrantUserPermissionRequest, ReparentRoleRequest, RoleAssignmentResponse, RoleResponse,
    UserGrantResponse,
};
