use scopegate_application::{
    CatalogBootstrapSummary, CreateAccessPolicyInput, CreateBranchAccessRuleInput,
    CreateRestrictionInput, CreateRoleInput, GrantUserPermissionInput,
};
use scopegate_core::AppError;
use scopegate_domain::{
    ConditionSet, PermissionKey, Role, RoleAssignment, RolePermissionGrant, UserPermissionGrant,
};

use super::{
    BootstrapSummaryResponse, CreateAccessPolicyRequest, CreateBranchAccessRuleRequest,
    CreateRestrictionRequest, CreateRoleRequest, GrantUserPermissionRequest,
    RoleAssignmentResponse, RoleResponse, UserGrantResponse,
};

impl TryFrom<CreateRoleRequest> for CreateRoleInput {
    type Error = AppError;

    fn try_from(value: CreateRoleRequest) -> Result<Self, Self::Error> {
        let grants = value
            .permissions
            .iter()
            .map(|slug| PermissionKey::from_slug(slug).map(RolePermissionGrant::full))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            slug: value.slug,
            name: value.name,
            level: value.level,
            scope: value.scope,
            branch_id: value.branch_id,
            parent_role_id: value.parent_role_id,
            grants,
        })
    }
}

impl TryFrom<GrantUserPermissionRequest> for GrantUserPermissionInput {
    type Error = AppError;

    fn try_from(value: GrantUserPermissionRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: value.user_id,
            permission: PermissionKey::from_slug(value.permission.as_str())?,
            access_level: value.access_level,
            conditions: value.conditions.unwrap_or_default(),
            expires_at: value.expires_at,
        })
    }
}

impl From<CreateRestrictionRequest> for CreateRestrictionInput {
    fn from(value: CreateRestrictionRequest) -> Self {
        Self {
            name: value.name,
            scope: value.scope,
            branch_id: value.branch_id,
            resource: value.resource,
            kind: value.kind,
        }
    }
}

impl From<CreateAccessPolicyRequest> for CreateAccessPolicyInput {
    fn from(value: CreateAccessPolicyRequest) -> Self {
        Self {
            name: value.name,
            resource: value.resource,
            action: value.action,
            target: value.target,
            effect: value.effect,
            conditions: value.conditions.unwrap_or_else(ConditionSet::always),
            priority: value.priority,
        }
    }
}

impl From<CreateBranchAccessRuleRequest> for CreateBranchAccessRuleInput {
    fn from(value: CreateBranchAccessRuleRequest) -> Self {
        Self {
            name: value.name,
            role_id: value.role_id,
            resource: value.resource,
            action: value.action,
            branch_ids: value.branch_ids,
        }
    }
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self {
            role_id: value.id(),
            tenant_id: value.tenant_id(),
            slug: value.slug().to_owned(),
            name: value.name().to_owned(),
            level: value.level(),
            scope: value.scope(),
            parent_role_id: value.parent_role_id(),
            is_system: value.is_system(),
            is_active: value.is_active(),
            permissions: value
                .grants()
                .iter()
                .map(|grant| grant.permission.slug())
                .collect(),
        }
    }
}

impl From<RoleAssignment> for RoleAssignmentResponse {
    fn from(value: RoleAssignment) -> Self {
        Self {
            assignment_id: value.assignment_id,
            user_id: value.user_id,
            role_id: value.role_id,
            branch_id: value.branch_id,
            expires_at: value.expires_at,
            assigned_by: value.assigned_by,
            is_active: value.is_active,
        }
    }
}

impl From<UserPermissionGrant> for UserGrantResponse {
    fn from(value: UserPermissionGrant) -> Self {
        Self {
            grant_id: value.grant_id,
            permission: value.permission.slug(),
            access_level: value.access_level,
            expires_at: value.expires_at,
            is_active: value.is_active,
        }
    }
}

impl From<CatalogBootstrapSummary> for BootstrapSummaryResponse {
    fn from(value: CatalogBootstrapSummary) -> Self {
        Self {
            permissions_created: value.permissions_created,
            roles_created: value.roles_created,
        }
    }
}
