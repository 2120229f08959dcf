//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod branch;
pub mod catalog;
mod condition;
mod decision;
mod permission;
mod policy;
mod principal;
mod resource_policy;
mod restriction;
mod role;
mod scope;
mod security;

pub use branch::{Branch, BranchAccessRule, ResourceInstance};
pub use catalog::{RoleTemplate, list_default_permissions, list_default_role_templates};
pub use condition::{Condition, ConditionContext, ConditionOperator, ConditionSet};
pub use decision::{AccessDecision, AccessResult, DataFilter, PermissionCheck, RequestContext};
pub use permission::{AccessLevel, Permission, PermissionKey, WILDCARD, part_matches};
pub use policy::{AccessPolicy, PolicyEffect, PolicyTarget, sort_by_priority};
pub use principal::{Principal, PrincipalStatus, UserPermissionGrant};
pub use resource_policy::{FieldCategory, FilterSubject, ResourcePolicy, ResourcePolicyCatalog};
pub use restriction::{
    ResourceRestriction, RestrictionInput, RestrictionKind, RestrictionProbe, RestrictionScope,
};
pub use role::{Role, RoleAssignment, RoleInput, RolePermissionGrant};
pub use scope::ScopeTag;
pub use security::{AdminPermission, AuditAction};
