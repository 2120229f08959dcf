//! Application services and ports.

#![forbid(unsafe_code)]

mod access_audit;
mod audit_ports;
mod authorization_ports;
mod authorization_service;
mod catalog_ports;
mod catalog_service;
mod role_graph;
mod scope_resolver;
mod security_admin_ports;
mod security_admin_service;

#[cfg(test)]
mod fakes;

pub use access_audit::AuditLogger;
pub use audit_ports::{AccessAuditEntry, AuditEvent, AuditRepository};
pub use authorization_ports::{
    AuthorizationRepository, BranchRepository, ResourceInstanceRepository,
};
pub use authorization_service::AuthorizationService;
pub use catalog_ports::CatalogRepository;
pub use catalog_service::{CatalogBootstrapSummary, CatalogService};
pub use role_graph::{DirectRole, EffectiveRoles, RoleGraph};
pub use scope_resolver::{ScopeResolution, ScopeResolver};
pub use security_admin_ports::{
    AssignRoleInput, CreateAccessPolicyInput, CreateBranchAccessRuleInput,
    CreateRestrictionInput, CreateRoleInput, GrantUserPermissionInput, SecurityAdminRepository,
};
pub use security_admin_service::SecurityAdminService;
