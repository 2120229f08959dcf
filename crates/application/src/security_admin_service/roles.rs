use super::*;

use scopegate_core::{AssignmentId, RoleId};
use scopegate_domain::{Role, RoleAssignment, RoleInput};

use crate::role_graph::EffectiveRoles;
use crate::security_admin_ports::{AssignRoleInput, CreateRoleInput};

impl SecurityAdminService {
    /// Returns tenant and system roles for administrative users.
    pub async fn list_roles(&self, actor: UserId, context: &RequestContext) -> AppResult<Vec<Role>> {
        let actor = self.require(actor, AdminPermission::RolesManage, context).await?;
        self.repository.list_roles(actor.tenant_id).await
    }

    /// Creates a tenant role and emits an audit event.
    pub async fn create_role(
        &self,
        actor: UserId,
        input: CreateRoleInput,
        context: &RequestContext,
    ) -> AppResult<Role> {
        let actor = self.require(actor, AdminPermission::RolesManage, context).await?;
        let graph = self.tenant_graph(actor.tenant_id).await?;

        // The tenant graph only holds this tenant's roles and system roles.
        if let Some(parent_role_id) = input.parent_role_id
            && graph.role(parent_role_id).is_none()
        {
            return Err(AppError::NotFound(format!(
                "parent role '{parent_role_id}' does not exist in this tenant"
            )));
        }

        let role = Role::new(
            RoleId::new(),
            RoleInput {
                tenant_id: Some(actor.tenant_id),
                slug: input.slug,
                name: input.name,
                level: input.level,
                scope: input.scope,
                branch_id: input.branch_id,
                parent_role_id: input.parent_role_id,
                grants: input.grants,
            },
        )?;

        let effective = self
            .authorization_service
            .effective_roles(actor.id, context)
            .await?;
        if !RoleGraph::can_manage_role(&effective, &role) {
            return Err(forbidden(
                &actor,
                format_args!("cannot create role '{}' at level {}", role.slug(), role.level()),
            ));
        }
        if let Some(parent_role_id) = role.parent_role_id() {
            ensure_inheritance_within_reach(
                &actor,
                &effective,
                &graph,
                role.slug(),
                parent_role_id,
            )?;
        }

        let role = self.repository.create_role(role).await?;

        self.record(
            &actor,
            AuditAction::SecurityRoleCreated,
            "rbac_role",
            role.id().to_string(),
            format!("created role '{}' at level {}", role.slug(), role.level()),
        )
        .await;

        Ok(role)
    }

    /// Points a tenant role at a new parent, refusing links that would close a cycle.
    pub async fn reparent_role(
        &self,
        actor: UserId,
        role_id: RoleId,
        parent_role_id: Option<RoleId>,
        context: &RequestContext,
    ) -> AppResult<()> {
        let actor = self.require(actor, AdminPermission::RolesManage, context).await?;
        let graph = self.tenant_graph(actor.tenant_id).await?;

        let role = graph
            .role(role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;
        if role.tenant_id() != Some(actor.tenant_id) {
            return Err(forbidden(
                &actor,
                format_args!("cannot modify role '{}' outside its tenant", role.slug()),
            ));
        }

        let effective = self
            .authorization_service
            .effective_roles(actor.id, context)
            .await?;
        if !RoleGraph::can_manage_role(&effective, role) {
            return Err(forbidden(&actor, format_args!("cannot modify role '{}'", role.slug())));
        }

        if let Some(parent_role_id) = parent_role_id {
            if graph.role(parent_role_id).is_none() {
                return Err(AppError::NotFound(format!(
                    "parent role '{parent_role_id}' does not exist"
                )));
            }
            if graph.would_create_cycle(role_id, parent_role_id) {
                return Err(AppError::Validation(format!(
                    "re-parenting role '{}' would create a cycle",
                    role.slug()
                )));
            }
            ensure_inheritance_within_reach(
                &actor,
                &effective,
                &graph,
                role.slug(),
                parent_role_id,
            )?;
        }

        self.repository
            .update_role_parent(role_id, parent_role_id)
            .await?;

        self.record(
            &actor,
            AuditAction::SecurityRoleReparented,
            "rbac_role",
            role_id.to_string(),
            match parent_role_id {
                Some(parent_role_id) => {
                    format!("role '{}' now inherits from '{parent_role_id}'", role.slug())
                }
                None => format!("role '{}' no longer inherits", role.slug()),
            },
        )
        .await;

        Ok(())
    }

    /// Assigns a role to a principal and emits an audit event.
    pub async fn assign_role(
        &self,
        actor: UserId,
        input: AssignRoleInput,
        context: &RequestContext,
    ) -> AppResult<RoleAssignment> {
        let actor = self.require(actor, AdminPermission::RolesAssign, context).await?;
        let graph = self.tenant_graph(actor.tenant_id).await?;

        let role = graph.role(input.role_id).ok_or_else(|| {
            AppError::NotFound(format!("role '{}' does not exist", input.role_id))
        })?;
        if !role.is_active() {
            return Err(AppError::Validation(format!(
                "role '{}' is inactive",
                role.slug()
            )));
        }
        if input
            .expires_at
            .is_some_and(|expires_at| expires_at <= context.requested_at)
        {
            return Err(AppError::Validation(
                "assignment expiry must be in the future".to_owned(),
            ));
        }

        let effective = self
            .authorization_service
            .effective_roles(actor.id, context)
            .await?;
        if role.is_system() && !effective.holds_system_role() {
            return Err(forbidden(
                &actor,
                format_args!("cannot assign system role '{}'", role.slug()),
            ));
        }
        if !RoleGraph::can_manage_role(&effective, role) {
            return Err(forbidden(
                &actor,
                format_args!("cannot assign role '{}'", role.slug()),
            ));
        }

        let assignment = RoleAssignment {
            assignment_id: AssignmentId::new(),
            user_id: input.user_id,
            role_id: role.id(),
            tenant_id: actor.tenant_id,
            branch_id: input.branch_id,
            expires_at: input.expires_at,
            assigned_by: Some(actor.id),
            is_active: true,
        };
        self.repository
            .create_role_assignment(assignment.clone())
            .await?;

        self.record(
            &actor,
            AuditAction::SecurityRoleAssigned,
            "rbac_role_assignment",
            assignment.assignment_id.to_string(),
            format!("assigned role '{}' to '{}'", role.slug(), input.user_id),
        )
        .await;

        Ok(assignment)
    }

    /// Deactivates a role assignment and emits an audit event.
    pub async fn unassign_role(
        &self,
        actor: UserId,
        assignment_id: AssignmentId,
        context: &RequestContext,
    ) -> AppResult<RoleAssignment> {
        let actor = self.require(actor, AdminPermission::RolesAssign, context).await?;

        let assignment = self
            .repository
            .deactivate_role_assignment(actor.tenant_id, assignment_id)
            .await?;

        self.record(
            &actor,
            AuditAction::SecurityRoleUnassigned,
            "rbac_role_assignment",
            assignment_id.to_string(),
            format!(
                "removed role '{}' from '{}'",
                assignment.role_id, assignment.user_id
            ),
        )
        .await;

        Ok(assignment)
    }
}

/// Refuses parent links that would hand a role's holders more authority than the actor has.
///
/// Holders inherit every ancestor, so the whole chain counts, not only the new role's level.
fn ensure_inheritance_within_reach(
    actor: &Principal,
    effective: &EffectiveRoles,
    graph: &RoleGraph,
    slug: &str,
    parent_role_id: RoleId,
) -> AppResult<()> {
    if effective.holds_system_role() {
        return Ok(());
    }

    let lineage = graph.ancestry(parent_role_id)?;
    if let Some(system_role) = lineage.iter().find(|ancestor| ancestor.is_system()) {
        return Err(forbidden(
            actor,
            format_args!(
                "cannot let role '{slug}' inherit from system role '{}'",
                system_role.slug()
            ),
        ));
    }

    let actor_level = effective.highest_level();
    if let Some(inherited) = lineage.iter().map(|ancestor| ancestor.level()).max()
        && actor_level.is_none_or(|ceiling| inherited >= ceiling)
    {
        return Err(forbidden(
            actor,
            format_args!("cannot let role '{slug}' inherit level {inherited} authority"),
        ));
    }

    Ok(())
}
