use std::str::FromStr;

use scopegate_core::{AppError, AppResult, BranchId, NonEmptyString, PolicyId, RoleId, TenantId, UserId};
use serde::{Deserialize, Serialize};

use crate::ConditionSet;
use crate::permission::part_matches;

/// Effect applied when a policy matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyEffect {
    /// Grants access and stops evaluation.
    Allow,
    /// Denies access and stops evaluation.
    Deny,
}

impl PolicyEffect {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::Deny => "DENY",
        }
    }
}

impl FromStr for PolicyEffect {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ALLOW" => Ok(Self::Allow),
            "DENY" => Ok(Self::Deny),
            _ => Err(AppError::Validation(format!(
                "unknown policy effect '{value}'"
            ))),
        }
    }
}

/// Subject a policy targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyTarget {
    /// One principal.
    User(UserId),
    /// Every holder of a role, directly or through inheritance.
    Role(RoleId),
    /// Every principal whose home branch matches.
    Branch(BranchId),
}

impl PolicyTarget {
    /// Returns the stable discriminator stored next to the target id.
    #[must_use]
    pub fn type_str(&self) -> &'static str {
        match self {
            Self::User(_) => "USER",
            Self::Role(_) => "ROLE",
            Self::Branch(_) => "BRANCH",
        }
    }

    /// Rebuilds a target from its stored discriminator and id.
    pub fn from_parts(target_type: &str, target_id: uuid::Uuid) -> AppResult<Self> {
        match target_type.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User(UserId::from_uuid(target_id))),
            "ROLE" => Ok(Self::Role(RoleId::from_uuid(target_id))),
            "BRANCH" => Ok(Self::Branch(BranchId::from_uuid(target_id))),
            _ => Err(AppError::Validation(format!(
                "unknown policy target type '{target_type}'"
            ))),
        }
    }

    /// Returns the target id.
    #[must_use]
    pub fn id(&self) -> uuid::Uuid {
        match self {
            Self::User(user_id) => user_id.as_uuid(),
            Self::Role(role_id) => role_id.as_uuid(),
            Self::Branch(branch_id) => branch_id.as_uuid(),
        }
    }
}

/// Tenant-scoped, prioritized allow/deny rule evaluated before grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPolicy {
    /// Policy id.
    pub id: PolicyId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Policy name used in applied-rule lists.
    pub name: NonEmptyString,
    /// Resource or `*`.
    pub resource: String,
    /// Action or `*`.
    pub action: String,
    /// Targeted subject.
    pub target: PolicyTarget,
    /// Effect on match.
    pub effect: PolicyEffect,
    /// Conditions that must hold.
    pub conditions: ConditionSet,
    /// Higher priorities are evaluated first.
    pub priority: i32,
    /// Inactive policies are ignored.
    pub is_active: bool,
}

impl AccessPolicy {
    /// Returns whether the policy covers the requested pair.
    #[must_use]
    pub fn covers(&self, resource: &str, action: &str) -> bool {
        self.is_active && part_matches(&self.resource, resource) && part_matches(&self.action, action)
    }
}

/// Sorts policies in evaluation order: priority descending, then id for determinism.
pub fn sort_by_priority(policies: &mut [AccessPolicy]) {
    policies.sort_by(|left, right| {
        right
            .priority
            .cmp(&left.priority)
            .then_with(|| left.id.cmp(&right.id))
    });
}

#[cfg(test)]
mod tests {
    use scopegate_core::{NonEmptyString, PolicyId, TenantId, UserId};

    use super::{AccessPolicy, PolicyEffect, PolicyTarget, sort_by_priority};
    use crate::ConditionSet;

    fn policy(priority: i32, effect: PolicyEffect) -> AccessPolicy {
        AccessPolicy {
            id: PolicyId::new(),
            tenant_id: TenantId::new(),
            name: NonEmptyString::new(format!("policy-{priority}"))
                .unwrap_or_else(|_| unreachable!()),
            resource: "students".to_owned(),
            action: "*".to_owned(),
            target: PolicyTarget::User(UserId::new()),
            effect,
            conditions: ConditionSet::always(),
            priority,
            is_active: true,
        }
    }

    #[test]
    fn higher_priority_sorts_first() {
        let mut policies = vec![policy(1, PolicyEffect::Allow), policy(10, PolicyEffect::Deny)];
        sort_by_priority(&mut policies);
        assert_eq!(policies[0].priority, 10);
    }

    #[test]
    fn wildcard_action_covers_any_action() {
        let policy = policy(1, PolicyEffect::Allow);
        assert!(policy.covers("students", "delete"));
        assert!(!policy.covers("tasks", "read"));
    }

    #[test]
    fn target_roundtrips_through_storage_parts() {
        let target = PolicyTarget::User(UserId::new());
        let restored = PolicyTarget::from_parts(target.type_str(), target.id());
        assert!(matches!(restored, Ok(value) if value == target));
    }
}
