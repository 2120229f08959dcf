use std::str::FromStr;

use chrono::{DateTime, Utc};
use scopegate_core::{AppError, BranchId, GrantId, TenantId, UserId};
use serde::{Deserialize, Serialize};

use crate::{AccessLevel, ConditionSet, PermissionKey, RoleAssignment};

/// Lifecycle status of a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalStatus {
    /// Principal may be authorized.
    Active,
    /// Principal was deactivated.
    Inactive,
    /// Principal has not completed onboarding.
    Pending,
}

impl PrincipalStatus {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Pending => "pending",
        }
    }
}

impl FromStr for PrincipalStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "pending" => Ok(Self::Pending),
            _ => Err(AppError::Validation(format!(
                "unknown principal status '{value}'"
            ))),
        }
    }
}

/// Direct principal-level permission override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPermissionGrant {
    /// Stable grant id.
    pub grant_id: GrantId,
    /// Granted resource and action.
    pub permission: PermissionKey,
    /// Access level; [`AccessLevel::None`] is an explicit denial.
    pub access_level: AccessLevel,
    /// Conditions that must hold for the grant to apply.
    pub conditions: ConditionSet,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Revoked grants stay inactive.
    pub is_active: bool,
}

impl UserPermissionGrant {
    /// Returns whether the grant expired at or before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Authenticated actor subject to an access decision, with eagerly loaded grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal id.
    pub id: UserId,
    /// Owning tenant (agency).
    pub tenant_id: TenantId,
    /// Home branch, when the principal belongs to one.
    pub branch_id: Option<BranchId>,
    /// Lifecycle status.
    pub status: PrincipalStatus,
    /// Legacy single role tag kept from the user record.
    pub legacy_role: Option<String>,
    /// Branches this principal manages.
    pub managed_branch_ids: Vec<BranchId>,
    /// Role assignments, including inactive ones.
    pub role_assignments: Vec<RoleAssignment>,
    /// Direct permission grants, including inactive ones.
    pub permission_grants: Vec<UserPermissionGrant>,
}

impl Principal {
    /// Returns whether the principal may be authorized at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == PrincipalStatus::Active
    }

    /// Returns assignments that are active and unexpired at `now`.
    pub fn effective_assignments(
        &self,
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = &RoleAssignment> + '_ {
        self.role_assignments
            .iter()
            .filter(move |assignment| assignment.is_effective_at(now))
    }
}
