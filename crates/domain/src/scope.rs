use std::str::FromStr;

use scopegate_core::AppError;
use serde::{Deserialize, Serialize};

/// Breadth of resources a role grants visibility into.
///
/// Variants are declared from narrowest to widest so the derived ordering
/// can be used directly for widest-scope-wins resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeTag {
    /// Records created by the principal.
    Own,
    /// Records assigned to (or created by) the principal.
    Assigned,
    /// The principal's branches and their descendants.
    Branch,
    /// Every branch under the principal's tenant.
    Agency,
    /// Every branch in the system. Only reachable through system roles.
    Global,
}

impl ScopeTag {
    /// Returns a stable storage value for this scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Own => "OWN",
            Self::Assigned => "ASSIGNED",
            Self::Branch => "BRANCH",
            Self::Agency => "AGENCY",
            Self::Global => "GLOBAL",
        }
    }

    /// Returns the wider of two scopes.
    #[must_use]
    pub fn widest(self, other: Self) -> Self {
        self.max(other)
    }

    /// Returns the scope narrowed to at most `ceiling`.
    #[must_use]
    pub fn narrowed_to(self, ceiling: Self) -> Self {
        self.min(ceiling)
    }

    /// Returns whether the scope is resolved per record rather than per branch.
    #[must_use]
    pub fn is_record_level(&self) -> bool {
        matches!(self, Self::Own | Self::Assigned)
    }
}

impl FromStr for ScopeTag {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "OWN" => Ok(Self::Own),
            "ASSIGNED" => Ok(Self::Assigned),
            "BRANCH" => Ok(Self::Branch),
            "AGENCY" => Ok(Self::Agency),
            "GLOBAL" => Ok(Self::Global),
            _ => Err(AppError::Validation(format!(
                "unknown scope value '{value}'"
            ))),
        }
    }
}
