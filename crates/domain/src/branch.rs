use std::collections::BTreeSet;

use scopegate_core::{BranchId, BranchRuleId, RoleId, TenantId, UserId};
use serde::{Deserialize, Serialize};

use crate::permission::part_matches;

/// Tenant sub-unit used as the unit of data-visibility scoping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Branch id.
    pub id: BranchId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Parent branch for nested offices.
    pub parent_branch_id: Option<BranchId>,
    /// Display name.
    pub name: String,
}

/// Narrowing rule intersected with a role's reachable branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchAccessRule {
    /// Rule id.
    pub id: BranchRuleId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Rule name used in applied-rule lists.
    pub name: String,
    /// Role the rule narrows; `None` narrows every role.
    pub role_id: Option<RoleId>,
    /// Resource the rule applies to; `None` for all resources.
    pub resource: Option<String>,
    /// Action the rule applies to; `None` for all actions.
    pub action: Option<String>,
    /// Branches the rule permits.
    pub branch_ids: BTreeSet<BranchId>,
    /// Inactive rules are ignored.
    pub is_active: bool,
}

impl BranchAccessRule {
    /// Returns whether the rule narrows the given role for the requested pair.
    ///
    /// A `None` role stands for a principal without assignments; only
    /// role-agnostic rules apply to it.
    #[must_use]
    pub fn applies_to(&self, role_id: Option<RoleId>, resource: &str, action: Option<&str>) -> bool {
        if !self.is_active {
            return false;
        }

        let role_matches = match (self.role_id, role_id) {
            (None, _) => true,
            (Some(rule_role), Some(role_id)) => rule_role == role_id,
            (Some(_), None) => false,
        };
        let resource_matches = self
            .resource
            .as_deref()
            .is_none_or(|rule_resource| part_matches(rule_resource, resource));
        let action_matches = match (self.action.as_deref(), action) {
            (None, _) => true,
            (Some(rule_action), Some(action)) => part_matches(rule_action, action),
            (Some(_), None) => false,
        };

        role_matches && resource_matches && action_matches
    }
}

/// Ownership projection of a concrete resource instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInstance {
    /// Resource type, such as `students`.
    pub resource_type: String,
    /// Instance id.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning branch; `None` for agency-level records.
    pub branch_id: Option<BranchId>,
    /// Principal the record is assigned to.
    pub assigned_to: Option<UserId>,
    /// Principal that created the record.
    pub created_by: Option<UserId>,
}

impl ResourceInstance {
    /// Returns whether the principal is assigned to or created the record.
    #[must_use]
    pub fn is_assigned_to_or_created_by(&self, user_id: UserId) -> bool {
        self.assigned_to == Some(user_id) || self.created_by == Some(user_id)
    }
}
