use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use scopegate_core::{AppResult, AssignmentId, BranchId, GrantId, RoleId, TenantId, UserId};
use scopegate_domain::{
    AccessLevel, AccessPolicy, BranchAccessRule, ConditionSet, PermissionKey, PolicyEffect,
    PolicyTarget, ResourceRestriction, RestrictionKind, RestrictionScope, Role, RoleAssignment,
    RolePermissionGrant, ScopeTag, UserPermissionGrant,
};

/// Input payload for creating a tenant role.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRoleInput {
    /// Unique slug in tenant scope.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Authority level.
    pub level: i32,
    /// Default scope.
    pub scope: ScopeTag,
    /// Optional branch binding.
    pub branch_id: Option<BranchId>,
    /// Optional parent role.
    pub parent_role_id: Option<RoleId>,
    /// Direct grants.
    pub grants: Vec<RolePermissionGrant>,
}

/// Input payload for assigning a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRoleInput {
    /// Principal receiving the role.
    pub user_id: UserId,
    /// Role to assign.
    pub role_id: RoleId,
    /// Optional branch binding for the assignment.
    pub branch_id: Option<BranchId>,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Input payload for a direct user grant.
#[derive(Debug, Clone, PartialEq)]
pub struct GrantUserPermissionInput {
    /// Principal receiving the grant.
    pub user_id: UserId,
    /// Granted permission.
    pub permission: PermissionKey,
    /// Access level; `none` records an explicit denial.
    pub access_level: AccessLevel,
    /// Conditions that must hold.
    pub conditions: ConditionSet,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Input payload for a resource restriction.
///
/// The owning tenant is taken from the acting principal; `global` restrictions
/// are reserved for system operators.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRestrictionInput {
    /// Display name, also used as the rule label in decisions.
    pub name: String,
    /// Whether the restriction binds every tenant, the actor's tenant, or one branch.
    pub scope: RestrictionScope,
    /// Branch binding for branch-scoped restrictions.
    pub branch_id: Option<BranchId>,
    /// Covered resource type, or `*`.
    pub resource: String,
    /// Veto behaviour.
    pub kind: RestrictionKind,
}

/// Input payload for an access policy.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateAccessPolicyInput {
    /// Display name.
    pub name: String,
    /// Resource pattern.
    pub resource: String,
    /// Action pattern.
    pub action: String,
    /// Principal or role the policy targets.
    pub target: PolicyTarget,
    /// Allow or deny.
    pub effect: PolicyEffect,
    /// Conditions that must hold.
    pub conditions: ConditionSet,
    /// Higher priorities are evaluated first.
    pub priority: i32,
}

/// Input payload for a branch access rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBranchAccessRuleInput {
    /// Display name.
    pub name: String,
    /// Role the rule narrows; `None` narrows every role.
    pub role_id: Option<RoleId>,
    /// Resource type filter.
    pub resource: Option<String>,
    /// Action filter.
    pub action: Option<String>,
    /// Branches the matching roles stay confined to.
    pub branch_ids: BTreeSet<BranchId>,
}

/// Repository port for security administration writes.
#[async_trait]
pub trait SecurityAdminRepository: Send + Sync {
    /// Lists tenant roles together with system roles.
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>>;

    /// Persists a new role; duplicate slugs in one tenant are a conflict.
    async fn create_role(&self, role: Role) -> AppResult<Role>;

    /// Replaces a role's parent link.
    async fn update_role_parent(
        &self,
        role_id: RoleId,
        parent_role_id: Option<RoleId>,
    ) -> AppResult<()>;

    /// Persists a new role assignment.
    async fn create_role_assignment(&self, assignment: RoleAssignment) -> AppResult<()>;

    /// Deactivates an assignment and returns it.
    async fn deactivate_role_assignment(
        &self,
        tenant_id: TenantId,
        assignment_id: AssignmentId,
    ) -> AppResult<RoleAssignment>;

    /// Persists a direct grant for a principal.
    async fn create_user_grant(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        grant: UserPermissionGrant,
    ) -> AppResult<()>;

    /// Revokes a direct grant.
    async fn revoke_user_grant(&self, tenant_id: TenantId, grant_id: GrantId) -> AppResult<()>;

    /// Persists a resource restriction.
    async fn create_restriction(&self, restriction: ResourceRestriction) -> AppResult<()>;

    /// Persists an access policy.
    async fn create_access_policy(&self, policy: AccessPolicy) -> AppResult<()>;

    /// Persists a branch access rule.
    async fn create_branch_access_rule(&self, rule: BranchAccessRule) -> AppResult<()>;
}
