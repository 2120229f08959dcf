use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use scopegate_core::{AppError, AppResult, RoleId};
use scopegate_domain::{AdminPermission, Principal, Role, RoleAssignment, RolePermissionGrant};

/// Role reached through one of the principal's own assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectRole {
    /// Assigned role.
    pub role: Role,
    /// Assignment that links the principal to the role.
    pub assignment: RoleAssignment,
}

/// Roles in force for one principal at one instant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EffectiveRoles {
    /// Roles from active, unexpired assignments.
    pub direct: Vec<DirectRole>,
    /// Direct roles followed by every reachable ancestor, without duplicates.
    pub all: Vec<Role>,
}

impl EffectiveRoles {
    /// Returns whether no role is in force.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty()
    }

    /// Returns whether a role is in force directly or through inheritance.
    #[must_use]
    pub fn contains(&self, role_id: RoleId) -> bool {
        self.all.iter().any(|role| role.id() == role_id)
    }

    /// Returns the active grants across every effective role.
    pub fn permissions(&self) -> impl Iterator<Item = (&Role, &RolePermissionGrant)> + '_ {
        self.all.iter().flat_map(|role| {
            role.grants()
                .iter()
                .filter(|grant| grant.is_active)
                .map(move |grant| (role, grant))
        })
    }

    /// Returns the highest authority level across effective roles.
    #[must_use]
    pub fn highest_level(&self) -> Option<i32> {
        self.all.iter().map(Role::level).max()
    }

    /// Returns whether any effective role is tenant-less.
    #[must_use]
    pub fn holds_system_role(&self) -> bool {
        self.direct.iter().any(|direct| direct.role.is_system())
    }
}

/// Arena of roles keyed by id, traversed through parent links.
#[derive(Debug, Clone, Default)]
pub struct RoleGraph {
    roles: HashMap<RoleId, Role>,
}

impl RoleGraph {
    /// Builds a graph from the roles visible to one tenant.
    #[must_use]
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().map(|role| (role.id(), role)).collect(),
        }
    }

    /// Returns one role by id.
    #[must_use]
    pub fn role(&self, role_id: RoleId) -> Option<&Role> {
        self.roles.get(&role_id)
    }

    /// Returns the role and its active ancestors, nearest first.
    ///
    /// An inactive or unknown role ends the chain. Revisiting a role is an
    /// integrity error.
    pub fn ancestry(&self, role_id: RoleId) -> AppResult<Vec<&Role>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = Some(role_id);

        while let Some(current_id) = cursor {
            if !visited.insert(current_id) {
                return Err(AppError::Integrity(format!(
                    "role hierarchy cycle detected at role '{current_id}' starting from '{role_id}'"
                )));
            }

            let Some(role) = self.roles.get(&current_id) else {
                break;
            };
            if !role.is_active() {
                break;
            }

            chain.push(role);
            cursor = role.parent_role_id();
        }

        Ok(chain)
    }

    /// Resolves the roles in force for a principal at `now`.
    pub fn effective_roles(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> AppResult<EffectiveRoles> {
        self.collect(principal.effective_assignments(now))
    }

    /// Resolves the roles a principal would hold if expired assignments were still in force.
    pub fn expired_roles(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> AppResult<EffectiveRoles> {
        self.collect(
            principal
                .role_assignments
                .iter()
                .filter(|assignment| assignment.is_active && assignment.is_expired_at(now)),
        )
    }

    /// Returns whether pointing `role_id` at `parent_role_id` would close a cycle.
    #[must_use]
    pub fn would_create_cycle(&self, role_id: RoleId, parent_role_id: RoleId) -> bool {
        let mut visited = HashSet::new();
        let mut cursor = Some(parent_role_id);

        while let Some(current_id) = cursor {
            if current_id == role_id || !visited.insert(current_id) {
                return true;
            }
            cursor = self
                .roles
                .get(&current_id)
                .and_then(Role::parent_role_id);
        }

        false
    }

    /// Returns whether `left` carries more authority than `right`.
    #[must_use]
    pub fn is_higher_role(left: &Role, right: &Role) -> bool {
        left.is_higher_than(right)
    }

    /// Returns whether the holder of `effective` may manage `target`.
    #[must_use]
    pub fn can_manage_role(effective: &EffectiveRoles, target: &Role) -> bool {
        let outranks = effective
            .highest_level()
            .is_some_and(|level| level > target.level());
        let manage = AdminPermission::RolesManage;
        let holds_manage = effective.permissions().any(|(_, grant)| {
            grant.access_level.grants_access()
                && grant.permission.covers(manage.resource(), manage.action())
        });

        outranks || holds_manage
    }

    fn collect<'a>(
        &self,
        assignments: impl Iterator<Item = &'a RoleAssignment>,
    ) -> AppResult<EffectiveRoles> {
        let mut effective = EffectiveRoles::default();
        let mut seen = HashSet::new();

        for assignment in assignments {
            let Some(role) = self.roles.get(&assignment.role_id) else {
                continue;
            };
            if !role.is_active() {
                continue;
            }

            for ancestor in self.ancestry(role.id())? {
                if seen.insert(ancestor.id()) {
                    effective.all.push(ancestor.clone());
                }
            }

            effective.direct.push(DirectRole {
                role: role.clone(),
                assignment: assignment.clone(),
            });
        }

        Ok(effective)
    }
}
