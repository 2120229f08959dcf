use std::fmt::{Display, Formatter};
use std::str::FromStr;

use scopegate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Wildcard accepted by policies and grants for any resource or action.
pub const WILDCARD: &str = "*";

/// Resource and action pair checked by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PermissionKey {
    resource: NonEmptyString,
    action: NonEmptyString,
}

impl PermissionKey {
    /// Creates a validated permission key.
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> AppResult<Self> {
        let resource = NonEmptyString::new(resource.into().trim().to_ascii_lowercase())?;
        let action = NonEmptyString::new(action.into().trim().to_ascii_lowercase())?;

        if resource.as_str().contains('.') || action.as_str().contains('.') {
            return Err(AppError::Validation(format!(
                "permission parts must not contain '.', got '{}.{}'",
                resource, action
            )));
        }

        Ok(Self { resource, action })
    }

    /// Parses a `resource.action` slug.
    pub fn from_slug(slug: &str) -> AppResult<Self> {
        let Some((resource, action)) = slug.split_once('.') else {
            return Err(AppError::Validation(format!(
                "permission slug '{slug}' must have the form 'resource.action'"
            )));
        };

        Self::new(resource, action)
    }

    /// Returns the resource name.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }

    /// Returns the action name.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the stable `resource.action` slug.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}.{}", self.resource, self.action)
    }

    /// Returns whether this key, which may carry wildcards, covers the requested pair.
    #[must_use]
    pub fn covers(&self, resource: &str, action: &str) -> bool {
        part_matches(self.resource(), resource) && part_matches(self.action(), action)
    }
}

impl Display for PermissionKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}.{}", self.resource, self.action)
    }
}

/// Returns whether a rule part (possibly `*`) matches a requested value.
#[must_use]
pub fn part_matches(rule_value: &str, requested: &str) -> bool {
    rule_value == WILDCARD || rule_value.eq_ignore_ascii_case(requested)
}

/// Immutable catalog entry created at bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    key: PermissionKey,
    category: NonEmptyString,
    description: String,
}

impl Permission {
    /// Creates a catalog permission.
    pub fn new(
        resource: impl Into<String>,
        action: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            key: PermissionKey::new(resource, action)?,
            category: NonEmptyString::new(category)?,
            description: description.into(),
        })
    }

    /// Returns the unique slug.
    #[must_use]
    pub fn slug(&self) -> String {
        self.key.slug()
    }

    /// Returns the permission key.
    #[must_use]
    pub fn key(&self) -> &PermissionKey {
        &self.key
    }

    /// Returns the catalog category.
    #[must_use]
    pub fn category(&self) -> &str {
        self.category.as_str()
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }
}

/// Access level carried by role and user grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// No access. On a direct user grant this is an explicit denial.
    None,
    /// Read-only access.
    Read,
    /// Access limited by the grant's conditions or data filters.
    Limited,
    /// Unrestricted access.
    Full,
}

impl AccessLevel {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Read => "read",
            Self::Limited => "limited",
            Self::Full => "full",
        }
    }

    /// Returns whether this level grants access at all.
    #[must_use]
    pub fn grants_access(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl FromStr for AccessLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "denied" => Ok(Self::None),
            "read" => Ok(Self::Read),
            "limited" => Ok(Self::Limited),
            "full" => Ok(Self::Full),
            _ => Err(AppError::Validation(format!(
                "unknown access level '{value}'"
            ))),
        }
    }
}
