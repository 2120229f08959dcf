use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Timelike, Utc};
use ipnet::IpNet;
use scopegate_core::{AppError, AppResult, BranchId, NonEmptyString, RestrictionId, TenantId};
use serde::{Deserialize, Serialize};

use crate::permission::{WILDCARD, part_matches};
use crate::{ConditionContext, ConditionSet};

/// Breadth a restriction applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestrictionScope {
    /// Applies to every tenant.
    Global,
    /// Applies to one tenant.
    Agency,
    /// Applies to one branch.
    Branch,
}

impl RestrictionScope {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "GLOBAL",
            Self::Agency => "AGENCY",
            Self::Branch => "BRANCH",
        }
    }
}

impl FromStr for RestrictionScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GLOBAL" => Ok(Self::Global),
            "AGENCY" => Ok(Self::Agency),
            "BRANCH" => Ok(Self::Branch),
            _ => Err(AppError::Validation(format!(
                "unknown restriction scope '{value}'"
            ))),
        }
    }
}

/// Condition under which a restriction vetoes access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RestrictionKind {
    /// Vetoes requests whose address is missing or outside every network.
    IpAllowList {
        /// Permitted networks.
        networks: Vec<IpNet>,
    },
    /// Vetoes requests whose address falls inside any network.
    IpDenyList {
        /// Blocked networks.
        networks: Vec<IpNet>,
    },
    /// Vetoes requests outside `[start_hour, end_hour)` UTC on the listed weekdays.
    TimeWindow {
        /// First permitted hour, inclusive.
        start_hour: u32,
        /// Last permitted hour, exclusive. Windows may wrap past midnight.
        end_hour: u32,
        /// Permitted ISO weekdays (1 = Monday). Empty permits every day.
        weekdays: Vec<u32>,
    },
    /// Vetoes requests for which the condition set holds.
    Conditional {
        /// Conditions that trigger the veto.
        conditions: ConditionSet,
    },
    /// Vetoes every request.
    KillSwitch,
}

impl RestrictionKind {
    /// Returns a stable storage value for the kind discriminator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IpAllowList { .. } => "ip_allow_list",
            Self::IpDenyList { .. } => "ip_deny_list",
            Self::TimeWindow { .. } => "time_window",
            Self::Conditional { .. } => "conditional",
            Self::KillSwitch => "kill_switch",
        }
    }

    fn validate(&self) -> AppResult<()> {
        match self {
            Self::IpAllowList { networks } | Self::IpDenyList { networks }
                if networks.is_empty() =>
            {
                Err(AppError::Validation(
                    "ip restrictions require at least one network".to_owned(),
                ))
            }
            Self::TimeWindow {
                start_hour,
                end_hour,
                weekdays,
            } => {
                if *start_hour > 23 || *end_hour > 24 || start_hour == end_hour {
                    return Err(AppError::Validation(format!(
                        "invalid time window {start_hour}..{end_hour}"
                    )));
                }
                if weekdays.iter().any(|day| !(1..=7).contains(day)) {
                    return Err(AppError::Validation(
                        "time window weekdays must be between 1 and 7".to_owned(),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Request attributes a restriction is matched against.
#[derive(Debug, Clone, Copy)]
pub struct RestrictionProbe<'a> {
    /// Client address, when known.
    pub ip_address: Option<IpAddr>,
    /// Evaluation instant.
    pub at: DateTime<Utc>,
    /// Condition context for conditional restrictions.
    pub conditions: &'a ConditionContext,
}

/// Named rule that vetoes an otherwise-granted access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRestriction {
    id: RestrictionId,
    name: NonEmptyString,
    scope: RestrictionScope,
    tenant_id: Option<TenantId>,
    branch_id: Option<BranchId>,
    resource: NonEmptyString,
    kind: RestrictionKind,
    is_active: bool,
}

/// Input payload for constructing a restriction.
#[derive(Debug, Clone, PartialEq)]
pub struct RestrictionInput {
    /// Rule name reported in deny reasons.
    pub name: String,
    /// Breadth.
    pub scope: RestrictionScope,
    /// Tenant for AGENCY and BRANCH restrictions.
    pub tenant_id: Option<TenantId>,
    /// Branch for BRANCH restrictions.
    pub branch_id: Option<BranchId>,
    /// Bound resource; `*` makes it a system restriction.
    pub resource: String,
    /// Veto condition.
    pub kind: RestrictionKind,
}

impl ResourceRestriction {
    /// Creates a validated restriction.
    pub fn new(id: RestrictionId, input: RestrictionInput) -> AppResult<Self> {
        let RestrictionInput {
            name,
            scope,
            tenant_id,
            branch_id,
            resource,
            kind,
        } = input;

        match (scope, tenant_id.is_some(), branch_id.is_some()) {
            (RestrictionScope::Global, false, false)
            | (RestrictionScope::Agency, true, false)
            | (RestrictionScope::Branch, true, true) => {}
            _ => {
                return Err(AppError::Validation(format!(
                    "restriction '{name}' has a {} scope that does not match its tenant/branch binding",
                    scope.as_str()
                )));
            }
        }

        kind.validate()?;

        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            scope,
            tenant_id,
            branch_id,
            resource: NonEmptyString::new(resource.trim().to_ascii_lowercase())?,
            kind,
            is_active: true,
        })
    }

    /// Returns a copy with the active flag set.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Returns the restriction id.
    #[must_use]
    pub fn id(&self) -> RestrictionId {
        self.id
    }

    /// Returns the rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the breadth.
    #[must_use]
    pub fn scope(&self) -> RestrictionScope {
        self.scope
    }

    /// Returns the tenant binding.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Returns the branch binding.
    #[must_use]
    pub fn branch_id(&self) -> Option<BranchId> {
        self.branch_id
    }

    /// Returns the bound resource.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }

    /// Returns the veto condition.
    #[must_use]
    pub fn kind(&self) -> &RestrictionKind {
        &self.kind
    }

    /// Returns the active flag.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns whether the restriction covers every resource.
    #[must_use]
    pub fn is_system_wide(&self) -> bool {
        self.resource.as_str() == WILDCARD
    }

    /// Returns whether the restriction is bound to this principal's tenant and branch.
    #[must_use]
    pub fn applies_to(&self, tenant_id: TenantId, branch_id: Option<BranchId>) -> bool {
        if !self.is_active {
            return false;
        }

        match self.scope {
            RestrictionScope::Global => true,
            RestrictionScope::Agency => self.tenant_id == Some(tenant_id),
            RestrictionScope::Branch => {
                self.tenant_id == Some(tenant_id) && self.branch_id.is_some() && self.branch_id == branch_id
            }
        }
    }

    /// Returns whether the restriction names the requested resource.
    #[must_use]
    pub fn covers_resource(&self, resource: &str) -> bool {
        part_matches(self.resource.as_str(), resource)
    }

    /// Returns whether the veto condition holds for the probe.
    #[must_use]
    pub fn matches(&self, probe: &RestrictionProbe<'_>) -> bool {
        match &self.kind {
            RestrictionKind::IpAllowList { networks } => match probe.ip_address {
                Some(address) => !networks.iter().any(|network| network.contains(&address)),
                None => true,
            },
            RestrictionKind::IpDenyList { networks } => probe
                .ip_address
                .is_some_and(|address| networks.iter().any(|network| network.contains(&address))),
            RestrictionKind::TimeWindow {
                start_hour,
                end_hour,
                weekdays,
            } => {
                let hour = probe.at.hour();
                let weekday = probe.at.weekday().number_from_monday();
                let within_hours = if start_hour < end_hour {
                    (*start_hour..*end_hour).contains(&hour)
                } else {
                    hour >= *start_hour || hour < *end_hour
                };
                let within_days = weekdays.is_empty() || weekdays.contains(&weekday);

                !(within_hours && within_days)
            }
            RestrictionKind::Conditional { conditions } => conditions.evaluate(probe.conditions),
            RestrictionKind::KillSwitch => true,
        }
    }
}
