use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use scopegate_core::{AppError, AppResult, BranchId, TenantId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{AccessLevel, ScopeTag};

/// Resource and action the caller wants to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCheck {
    /// Resource name, such as `students`.
    pub resource: String,
    /// Action name, such as `read`.
    pub action: String,
    /// Concrete instance, when the check targets one.
    pub resource_id: Option<String>,
}

impl PermissionCheck {
    /// Creates a type-level check.
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> AppResult<Self> {
        let resource = resource.into().trim().to_ascii_lowercase();
        let action = action.into().trim().to_ascii_lowercase();

        if resource.is_empty() || action.is_empty() {
            return Err(AppError::Validation(
                "permission checks require a resource and an action".to_owned(),
            ));
        }

        Ok(Self {
            resource,
            action,
            resource_id: None,
        })
    }

    /// Returns a copy targeting one instance.
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Returns the `resource.action` slug.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}.{}", self.resource, self.action)
    }
}

/// Request attributes supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Agency the request is addressed to.
    pub agency_id: Option<TenantId>,
    /// Branch the request is addressed to.
    pub branch_id: Option<BranchId>,
    /// Client address.
    pub ip_address: Option<IpAddr>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Evaluation instant used for expiries and time windows.
    pub requested_at: DateTime<Utc>,
}

impl RequestContext {
    /// Creates an empty context evaluated at the current instant.
    #[must_use]
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    /// Creates an empty context evaluated at `requested_at`.
    #[must_use]
    pub fn at(requested_at: DateTime<Utc>) -> Self {
        Self {
            agency_id: None,
            branch_id: None,
            ip_address: None,
            user_agent: None,
            requested_at,
        }
    }

    /// Returns a copy with the client address set.
    #[must_use]
    pub fn with_ip_address(mut self, ip_address: IpAddr) -> Self {
        self.ip_address = Some(ip_address);
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::now()
    }
}

/// Audit result category of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessResult {
    /// Access granted.
    Allowed,
    /// Access denied by missing grants, policy, or scope.
    Denied,
    /// Access vetoed by a restriction.
    Restricted,
    /// Access would have been granted by an expired grant or assignment.
    Expired,
    /// Access awaits an approval workflow.
    PendingApproval,
}

impl AccessResult {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allowed => "ALLOWED",
            Self::Denied => "DENIED",
            Self::Restricted => "RESTRICTED",
            Self::Expired => "EXPIRED",
            Self::PendingApproval => "PENDING_APPROVAL",
        }
    }
}

impl FromStr for AccessResult {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ALLOWED" => Ok(Self::Allowed),
            "DENIED" => Ok(Self::Denied),
            "RESTRICTED" => Ok(Self::Restricted),
            "EXPIRED" => Ok(Self::Expired),
            "PENDING_APPROVAL" => Ok(Self::PendingApproval),
            _ => Err(AppError::Validation(format!(
                "unknown access result '{value}'"
            ))),
        }
    }
}

/// Query predicate the caller applies when listing resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DataFilter {
    /// No narrowing.
    Unrestricted,
    /// Matches zero rows.
    MatchNone,
    /// Field equals a value.
    Eq {
        /// Record field.
        field: String,
        /// Expected value.
        value: String,
    },
    /// Field is one of the values.
    In {
        /// Record field.
        field: String,
        /// Accepted values.
        values: Vec<String>,
    },
    /// Every nested filter holds.
    All {
        /// Nested filters.
        filters: Vec<DataFilter>,
    },
    /// At least one nested filter holds.
    Any {
        /// Nested filters.
        filters: Vec<DataFilter>,
    },
}

impl DataFilter {
    /// Builds an equality filter.
    #[must_use]
    pub fn eq(field: &str, value: impl ToString) -> Self {
        Self::Eq {
            field: field.to_owned(),
            value: value.to_string(),
        }
    }

    /// Builds a membership filter, collapsing an empty set to [`DataFilter::MatchNone`].
    #[must_use]
    pub fn one_of<T: ToString>(field: &str, values: impl IntoIterator<Item = T>) -> Self {
        let values: Vec<String> = values.into_iter().map(|value| value.to_string()).collect();
        if values.is_empty() {
            return Self::MatchNone;
        }

        Self::In {
            field: field.to_owned(),
            values,
        }
    }
}

/// Structured outcome of one permission evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Whether the action may proceed.
    pub allowed: bool,
    /// Audit result category.
    pub result: AccessResult,
    /// Human-readable reason.
    pub reason: String,
    /// Branches reachable for the resource type.
    pub accessible_branches: BTreeSet<BranchId>,
    /// Effective scope used to compute the branches.
    pub branch_scope: Option<ScopeTag>,
    /// Identifiers of the rules that contributed.
    pub applied_rules: Vec<String>,
    /// Field category → permission slugs required to view it.
    pub field_permissions: BTreeMap<String, Vec<String>>,
    /// Predicate to apply when listing resources.
    pub data_filter: Option<DataFilter>,
    /// Access level of the grant that allowed the request.
    pub access_level: Option<AccessLevel>,
}

impl AccessDecision {
    /// Reason carried by decisions for principals the store does not know.
    pub const PRINCIPAL_NOT_FOUND: &'static str = "principal not found";

    /// Creates an allow decision without scope projections.
    #[must_use]
    pub fn allow(reason: impl Into<String>, applied_rules: Vec<String>) -> Self {
        Self {
            allowed: true,
            result: AccessResult::Allowed,
            reason: reason.into(),
            accessible_branches: BTreeSet::new(),
            branch_scope: None,
            applied_rules,
            field_permissions: BTreeMap::new(),
            data_filter: None,
            access_level: None,
        }
    }

    /// Creates a deny decision with the given result category.
    #[must_use]
    pub fn deny(result: AccessResult, reason: impl Into<String>, applied_rules: Vec<String>) -> Self {
        Self {
            allowed: false,
            result,
            reason: reason.into(),
            accessible_branches: BTreeSet::new(),
            branch_scope: None,
            applied_rules,
            field_permissions: BTreeMap::new(),
            data_filter: None,
            access_level: None,
        }
    }

    /// Returns whether the decision was denied because the principal is unknown.
    #[must_use]
    pub fn is_unknown_principal(&self) -> bool {
        !self.allowed && self.reason == Self::PRINCIPAL_NOT_FOUND
    }

    /// Downgrades an allow to a deny, keeping the applied rules.
    #[must_use]
    pub fn downgrade(self, result: AccessResult, reason: impl Into<String>) -> Self {
        let mut denied = Self::deny(result, reason, self.applied_rules);
        denied.branch_scope = self.branch_scope;
        denied
    }

    /// Returns the JSON context blob recorded in the audit log.
    #[must_use]
    pub fn audit_context(&self) -> Value {
        json!({
            "branch_scope": self.branch_scope.map(|scope| scope.as_str()),
            "accessible_branches": self
                .accessible_branches
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            "applied_rules": self.applied_rules,
            "field_permissions": self.field_permissions,
            "data_filter": self.data_filter,
            "access_level": self.access_level.map(|level| level.as_str()),
        })
    }
}
