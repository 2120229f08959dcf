use std::sync::Arc;

use scopegate_core::{AppError, AppResult, RoleId, UserId};
use scopegate_domain::{
    AccessDecision, AdminPermission, PermissionCheck, Principal, RequestContext,
    ResourcePolicyCatalog, ScopeTag,
};

use crate::access_audit::AuditLogger;
use crate::role_graph::{EffectiveRoles, RoleGraph};
use crate::scope_resolver::ScopeResolution;
use crate::{AuditRepository, AuthorizationRepository, BranchRepository, ResourceInstanceRepository};

/// Application service deciding whether principals may act on resources.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
    branch_repository: Arc<dyn BranchRepository>,
    resource_repository: Arc<dyn ResourceInstanceRepository>,
    resource_policies: Arc<ResourcePolicyCatalog>,
    audit_logger: AuditLogger,
}

impl AuthorizationService {
    /// Creates a new authorization service from its ports and resource policy table.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AuthorizationRepository>,
        branch_repository: Arc<dyn BranchRepository>,
        resource_repository: Arc<dyn ResourceInstanceRepository>,
        resource_policies: ResourcePolicyCatalog,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            repository,
            branch_repository,
            resource_repository,
            resource_policies: Arc::new(resource_policies),
            audit_logger: AuditLogger::new(audit_repository),
        }
    }

    /// Decides one type-level check and records it in the access log.
    pub async fn check_permission(
        &self,
        principal_id: UserId,
        check: &PermissionCheck,
        context: &RequestContext,
    ) -> AppResult<AccessDecision> {
        let (tenant_id, decision) = match self.load_subject(principal_id, context).await? {
            SubjectLookup::Found(subject) => (
                Some(subject.principal.tenant_id),
                self.evaluate(&subject, check, context, None).await?,
            ),
            SubjectLookup::Denied { tenant_id, decision } => (tenant_id, decision),
        };

        self.audit_logger
            .log_decision(principal_id, tenant_id, check, context, &decision)
            .await;

        Ok(decision)
    }

    /// Resolves the scope and branches a principal reaches for a resource type.
    pub async fn resolve_accessible_branches(
        &self,
        principal_id: UserId,
        resource_type: &str,
        requested_scope: Option<ScopeTag>,
    ) -> AppResult<ScopeResolution> {
        match self.load_subject(principal_id, &RequestContext::now()).await? {
            SubjectLookup::Found(subject) => {
                self.resolve_scope(&subject, resource_type, None, requested_scope)
                    .await
            }
            SubjectLookup::Denied { .. } => Ok(ScopeResolution::default()),
        }
    }

    /// Returns whether a principal may manage the target role.
    pub async fn can_manage_role(&self, principal_id: UserId, target_role_id: RoleId) -> AppResult<bool> {
        let SubjectLookup::Found(subject) = self.load_subject(principal_id, &RequestContext::now()).await?
        else {
            return Ok(false);
        };

        let target = subject.graph.role(target_role_id).ok_or_else(|| {
            AppError::NotFound(format!("role '{target_role_id}' does not exist"))
        })?;

        Ok(RoleGraph::can_manage_role(&subject.roles, target))
    }

    /// Ensures a principal holds an admin permission and returns the loaded principal.
    pub async fn require_permission(
        &self,
        principal_id: UserId,
        permission: AdminPermission,
        context: &RequestContext,
    ) -> AppResult<Principal> {
        let check = PermissionCheck::new(permission.resource(), permission.action())?;
        let decision = self.check_permission(principal_id, &check, context).await?;

        if !decision.allowed {
            return Err(AppError::Forbidden(format!(
                "principal '{principal_id}' is missing permission '{}': {}",
                permission.as_str(),
                decision.reason
            )));
        }

        match self.repository.find_principal(principal_id).await? {
            Some(principal) => Ok(principal),
            None => Err(AppError::Unauthorized(format!(
                "principal '{principal_id}' does not exist"
            ))),
        }
    }

    /// Returns the roles in force for a principal; empty when the principal cannot be authorized.
    pub async fn effective_roles(
        &self,
        principal_id: UserId,
        context: &RequestContext,
    ) -> AppResult<EffectiveRoles> {
        match self.load_subject(principal_id, context).await? {
            SubjectLookup::Found(subject) => Ok(subject.roles),
            SubjectLookup::Denied { .. } => Ok(EffectiveRoles::default()),
        }
    }

    /// Returns whether the principal holds a tenant-less role.
    pub async fn holds_system_role(&self, principal_id: UserId) -> AppResult<bool> {
        match self.load_subject(principal_id, &RequestContext::now()).await? {
            SubjectLookup::Found(subject) => Ok(subject.roles.holds_system_role()),
            SubjectLookup::Denied { .. } => Ok(false),
        }
    }
}

mod evaluation;
mod projection;
mod resource_access;

use evaluation::SubjectLookup;

#[cfg(test)]
mod tests;
