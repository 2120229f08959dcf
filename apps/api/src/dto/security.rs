use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use scopegate_core::{AssignmentId, BranchId, GrantId, RoleId, TenantId, UserId};
use scopegate_domain::{
    AccessLevel, ConditionSet, PolicyEffect, PolicyTarget, RestrictionKind, RestrictionScope,
    ScopeTag,
};
use serde::{Deserialize, Serialize};

mod conversions;

/// Incoming payload for tenant role creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub slug: String,
    pub name: String,
    pub level: i32,
    pub scope: ScopeTag,
    #[serde(default)]
    pub branch_id: Option<BranchId>,
    #[serde(default)]
    pub parent_role_id: Option<RoleId>,
    /// Permission slugs granted with full access, such as `students.read`.
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Incoming payload for changing a role's parent.
#[derive(Debug, Deserialize)]
pub struct ReparentRoleRequest {
    pub parent_role_id: Option<RoleId>,
}

/// Incoming payload for role assignment.
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub user_id: UserId,
    pub role_id: RoleId,
    #[serde(default)]
    pub branch_id: Option<BranchId>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Incoming payload for a direct user grant.
#[derive(Debug, Deserialize)]
pub struct GrantUserPermissionRequest {
    pub user_id: UserId,
    pub permission: String,
    pub access_level: AccessLevel,
    #[serde(default)]
    pub conditions: Option<ConditionSet>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Incoming payload for a resource restriction; the kind is inlined.
#[derive(Debug, Deserialize)]
pub struct CreateRestrictionRequest {
    pub name: String,
    pub scope: RestrictionScope,
    #[serde(default)]
    pub branch_id: Option<BranchId>,
    pub resource: String,
    #[serde(flatten)]
    pub kind: RestrictionKind,
}

/// Incoming payload for an access policy.
#[derive(Debug, Deserialize)]
pub struct CreateAccessPolicyRequest {
    pub name: String,
    pub resource: String,
    pub action: String,
    pub target: PolicyTarget,
    pub effect: PolicyEffect,
    #[serde(default)]
    pub conditions: Option<ConditionSet>,
    #[serde(default)]
    pub priority: i32,
}

/// Incoming payload for a branch access rule.
#[derive(Debug, Deserialize)]
pub struct CreateBranchAccessRuleRequest {
    pub name: String,
    #[serde(default)]
    pub role_id: Option<RoleId>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    pub branch_ids: BTreeSet<BranchId>,
}

/// API representation of an RBAC role.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role_id: RoleId,
    pub tenant_id: Option<TenantId>,
    pub slug: String,
    pub name: String,
    pub level: i32,
    pub scope: ScopeTag,
    pub parent_role_id: Option<RoleId>,
    pub is_system: bool,
    pub is_active: bool,
    pub permissions: Vec<String>,
}

/// API representation of a role assignment.
#[derive(Debug, Serialize)]
pub struct RoleAssignmentResponse {
    pub assignment_id: AssignmentId,
    pub user_id: UserId,
    pub role_id: RoleId,
    pub branch_id: Option<BranchId>,
    pub expires_at: Option<DateTime<Utc>>,
    pub assigned_by: Option<UserId>,
    pub is_active: bool,
}

/// API representation of a direct user grant.
#[derive(Debug, Serialize)]
pub struct UserGrantResponse {
    pub grant_id: GrantId,
    pub permission: String,
    pub access_level: AccessLevel,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Outcome of a tenant bootstrap.
#[derive(Debug, Serialize)]
pub struct BootstrapSummaryResponse {
    pub permissions_created: usize,
    pub roles_created: Vec<String>,
}
