use chrono::{DateTime, Utc};
use scopegate_core::{AppError, AppResult, AssignmentId, BranchId, NonEmptyString, RoleId, TenantId, UserId};
use serde::{Deserialize, Serialize};

use crate::{AccessLevel, ConditionSet, PermissionKey, ScopeTag};

/// Permission attached to a role, optionally conditional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolePermissionGrant {
    /// Granted resource and action.
    pub permission: PermissionKey,
    /// Granted access level.
    pub access_level: AccessLevel,
    /// Conditions that must hold for the grant to apply.
    pub conditions: ConditionSet,
    /// Inactive grants are ignored.
    pub is_active: bool,
}

impl RolePermissionGrant {
    /// Creates an unconditional, active, full-access grant.
    #[must_use]
    pub fn full(permission: PermissionKey) -> Self {
        Self {
            permission,
            access_level: AccessLevel::Full,
            conditions: ConditionSet::always(),
            is_active: true,
        }
    }
}

/// Tenant or system role with optional single-parent inheritance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    tenant_id: Option<TenantId>,
    slug: NonEmptyString,
    name: NonEmptyString,
    level: i32,
    scope: ScopeTag,
    branch_id: Option<BranchId>,
    parent_role_id: Option<RoleId>,
    is_active: bool,
    grants: Vec<RolePermissionGrant>,
}

/// Input payload for constructing one role.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleInput {
    /// Owning tenant; `None` for system roles.
    pub tenant_id: Option<TenantId>,
    /// Unique slug within the tenant.
    pub slug: String,
    /// Human-readable name.
    pub name: String,
    /// Authority level; higher means more authority.
    pub level: i32,
    /// Default visibility scope.
    pub scope: ScopeTag,
    /// Branch binding for branch-scoped roles.
    pub branch_id: Option<BranchId>,
    /// Parent role whose grants are inherited.
    pub parent_role_id: Option<RoleId>,
    /// Direct grants.
    pub grants: Vec<RolePermissionGrant>,
}

impl Role {
    /// Creates a validated role.
    pub fn new(id: RoleId, input: RoleInput) -> AppResult<Self> {
        let RoleInput {
            tenant_id,
            slug,
            name,
            level,
            scope,
            branch_id,
            parent_role_id,
            grants,
        } = input;

        if scope == ScopeTag::Global && tenant_id.is_some() {
            return Err(AppError::Validation(format!(
                "role '{slug}' is tenant-scoped and cannot use GLOBAL scope"
            )));
        }

        if parent_role_id == Some(id) {
            return Err(AppError::Validation(format!(
                "role '{slug}' cannot be its own parent"
            )));
        }

        let slug = NonEmptyString::new(slug.trim().to_ascii_lowercase())?;
        if !slug
            .as_str()
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || character == '_')
        {
            return Err(AppError::Validation(format!(
                "role slug '{slug}' may only contain letters, digits and underscores"
            )));
        }

        Ok(Self {
            id,
            tenant_id,
            slug,
            name: NonEmptyString::new(name)?,
            level,
            scope,
            branch_id,
            parent_role_id,
            is_active: true,
            grants,
        })
    }

    /// Returns a copy with the active flag set.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Returns a copy with a new parent link.
    #[must_use]
    pub fn with_parent(mut self, parent_role_id: Option<RoleId>) -> Self {
        self.parent_role_id = parent_role_id;
        self
    }

    /// Returns the role id.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the owning tenant, or `None` for system roles.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Returns whether the role is system-wide.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.tenant_id.is_none()
    }

    /// Returns the slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_str()
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the authority level.
    #[must_use]
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Returns the default scope.
    #[must_use]
    pub fn scope(&self) -> ScopeTag {
        self.scope
    }

    /// Returns the branch binding.
    #[must_use]
    pub fn branch_id(&self) -> Option<BranchId> {
        self.branch_id
    }

    /// Returns the parent role.
    #[must_use]
    pub fn parent_role_id(&self) -> Option<RoleId> {
        self.parent_role_id
    }

    /// Returns the active flag.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the direct grants.
    #[must_use]
    pub fn grants(&self) -> &[RolePermissionGrant] {
        &self.grants
    }

    /// Returns whether `self` carries more authority than `other`.
    #[must_use]
    pub fn is_higher_than(&self, other: &Role) -> bool {
        self.level > other.level
    }
}

/// Link between a principal and a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Stable assignment id.
    pub assignment_id: AssignmentId,
    /// Assigned principal.
    pub user_id: UserId,
    /// Assigned role.
    pub role_id: RoleId,
    /// Tenant scope of the assignment.
    pub tenant_id: TenantId,
    /// Optional branch the assignment is bound to.
    pub branch_id: Option<BranchId>,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Actor that created the assignment.
    pub assigned_by: Option<UserId>,
    /// Deactivated assignments are kept for the audit trail.
    pub is_active: bool,
}

impl RoleAssignment {
    /// Returns whether the assignment is active and unexpired at `now`.
    #[must_use]
    pub fn is_effective_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now)
    }

    /// Returns whether the assignment expired at or before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use scopegate_core::{AssignmentId, RoleId, TenantId, UserId};

    use super::{Role, RoleAssignment, RoleInput};
    use crate::ScopeTag;

    fn input(tenant_id: Option<TenantId>, scope: ScopeTag) -> RoleInput {
        RoleInput {
            tenant_id,
            slug: "Branch_Manager".to_owned(),
            name: "Branch Manager".to_owned(),
            level: 70,
            scope,
            branch_id: None,
            parent_role_id: None,
            grants: Vec::new(),
        }
    }

    #[test]
    fn slug_is_normalized_to_lowercase() {
        let role = Role::new(RoleId::new(), input(Some(TenantId::new()), ScopeTag::Branch));
        assert!(matches!(role, Ok(role) if role.slug() == "branch_manager"));
    }

    #[test]
    fn tenant_role_cannot_be_global() {
        let role = Role::new(RoleId::new(), input(Some(TenantId::new()), ScopeTag::Global));
        assert!(role.is_err());
    }

    #[test]
    fn role_cannot_parent_itself() {
        let role_id = RoleId::new();
        let mut role_input = input(None, ScopeTag::Global);
        role_input.parent_role_id = Some(role_id);
        assert!(Role::new(role_id, role_input).is_err());
    }

    #[test]
    fn expired_assignment_is_inert() {
        let now = Utc::now();
        let assignment = RoleAssignment {
            assignment_id: AssignmentId::new(),
            user_id: UserId::new(),
            role_id: RoleId::new(),
            tenant_id: TenantId::new(),
            branch_id: None,
            expires_at: Some(now - Duration::minutes(1)),
            assigned_by: None,
            is_active: true,
        };
        assert!(!assignment.is_effective_at(now));
        assert!(assignment.is_expired_at(now));
    }
}
