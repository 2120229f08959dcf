use scopegate_application::ScopeResolution;
use scopegate_core::BranchId;
use scopegate_domain::ScopeTag;
use serde::{Deserialize, Serialize};

/// Incoming payload for a type-level permission check.
#[derive(Debug, Deserialize)]
pub struct PermissionCheckRequest {
    pub resource: String,
    pub action: String,
}

/// Incoming payload for a check against one resource instance.
#[derive(Debug, Deserialize)]
pub struct ResourceAccessRequest {
    pub resource_type: String,
    pub resource_id: String,
    pub action: String,
}

/// Incoming payload for branch visibility resolution.
#[derive(Debug, Deserialize)]
pub struct AccessibleBranchesRequest {
    pub resource_type: String,
    #[serde(default)]
    pub scope: Option<ScopeTag>,
}

/// Branch visibility for the calling principal.
#[derive(Debug, Serialize)]
pub struct AccessibleBranchesResponse {
    pub scope: Option<ScopeTag>,
    pub branches: Vec<BranchId>,
    pub applied_rules: Vec<String>,
}

impl From<ScopeResolution> for AccessibleBranchesResponse {
    fn from(value: ScopeResolution) -> Self {
        Self {
            scope: value.scope,
            branches: value.branches.into_iter().collect(),
            applied_rules: value.applied_rules,
        }
    }
}
