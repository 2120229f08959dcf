use std::str::FromStr;

use scopegate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::PermissionKey;

/// Permissions that guard security administration use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminPermission {
    /// Allows creating and re-parenting roles.
    RolesManage,
    /// Allows assigning and unassigning roles.
    RolesAssign,
    /// Allows granting and revoking direct user permissions.
    PermissionsManage,
    /// Allows creating resource restrictions.
    RestrictionsManage,
    /// Allows creating access policies.
    PoliciesManage,
    /// Allows creating branch access rules.
    BranchesManage,
    /// Allows bootstrapping the RBAC catalog for a tenant.
    SettingsManage,
}

impl AdminPermission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RolesManage => "roles.manage",
            Self::RolesAssign => "roles.assign",
            Self::PermissionsManage => "permissions.manage",
            Self::RestrictionsManage => "restrictions.manage",
            Self::PoliciesManage => "policies.manage",
            Self::BranchesManage => "branches.manage",
            Self::SettingsManage => "settings.manage",
        }
    }

    /// Returns the resource half of the slug.
    #[must_use]
    pub fn resource(&self) -> &'static str {
        self.as_str()
            .split_once('.')
            .map_or("", |(resource, _)| resource)
    }

    /// Returns the action half of the slug.
    #[must_use]
    pub fn action(&self) -> &'static str {
        self.as_str().split_once('.').map_or("", |(_, action)| action)
    }

    /// Returns the permission key checked by the evaluator.
    pub fn key(&self) -> AppResult<PermissionKey> {
        PermissionKey::from_slug(self.as_str())
    }

    /// Returns all admin permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AdminPermission] = &[
            AdminPermission::RolesManage,
            AdminPermission::RolesAssign,
            AdminPermission::PermissionsManage,
            AdminPermission::RestrictionsManage,
            AdminPermission::PoliciesManage,
            AdminPermission::BranchesManage,
            AdminPermission::SettingsManage,
        ];

        ALL
    }
}

impl FromStr for AdminPermission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|permission| permission.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown admin permission '{value}'")))
    }
}

/// Stable audit actions emitted by security administration use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a role is created.
    SecurityRoleCreated,
    /// Emitted when a role's parent changes.
    SecurityRoleReparented,
    /// Emitted when a role is assigned to a principal.
    SecurityRoleAssigned,
    /// Emitted when a role assignment is deactivated.
    SecurityRoleUnassigned,
    /// Emitted when a direct user grant is created.
    SecurityUserGrantCreated,
    /// Emitted when a direct user grant is revoked.
    SecurityUserGrantRevoked,
    /// Emitted when a resource restriction is created.
    SecurityRestrictionCreated,
    /// Emitted when an access policy is created.
    SecurityPolicyCreated,
    /// Emitted when a branch access rule is created.
    SecurityBranchRuleCreated,
    /// Emitted when a tenant's default roles are bootstrapped.
    SecurityTenantBootstrapped,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SecurityRoleCreated => "security.role.created",
            Self::SecurityRoleReparented => "security.role.reparented",
            Self::SecurityRoleAssigned => "security.role.assigned",
            Self::SecurityRoleUnassigned => "security.role.unassigned",
            Self::SecurityUserGrantCreated => "security.user_grant.created",
            Self::SecurityUserGrantRevoked => "security.user_grant.revoked",
            Self::SecurityRestrictionCreated => "security.restriction.created",
            Self::SecurityPolicyCreated => "security.policy.created",
            Self::SecurityBranchRuleCreated => "security.branch_rule.created",
            Self::SecurityTenantBootstrapped => "security.tenant.bootstrapped",
        }
    }
}
