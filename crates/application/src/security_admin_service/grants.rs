use super::*;

use scopegate_core::GrantId;
use scopegate_domain::UserPermissionGrant;

use crate::security_admin_ports::GrantUserPermissionInput;

impl SecurityAdminService {
    /// Records a direct permission override for a principal.
    ///
    /// A grant at access level `none` is an explicit denial and beats every
    /// role grant for the same permission.
    pub async fn grant_user_permission(
        &self,
        actor: UserId,
        input: GrantUserPermissionInput,
        context: &RequestContext,
    ) -> AppResult<UserPermissionGrant> {
        let actor = self
            .require(actor, AdminPermission::PermissionsManage, context)
            .await?;

        if input
            .expires_at
            .is_some_and(|expires_at| expires_at <= context.requested_at)
        {
            return Err(AppError::Validation(
                "grant expiry must be in the future".to_owned(),
            ));
        }

        let grant = UserPermissionGrant {
            grant_id: GrantId::new(),
            permission: input.permission,
            access_level: input.access_level,
            conditions: input.conditions,
            expires_at: input.expires_at,
            is_active: true,
        };
        self.repository
            .create_user_grant(actor.tenant_id, input.user_id, grant.clone())
            .await?;

        self.record(
            &actor,
            AuditAction::SecurityUserGrantCreated,
            "rbac_user_grant",
            grant.grant_id.to_string(),
            format!(
                "granted '{}' at level '{}' to '{}'",
                grant.permission.slug(),
                grant.access_level.as_str(),
                input.user_id
            ),
        )
        .await;

        Ok(grant)
    }

    /// Revokes a direct grant and emits an audit event.
    pub async fn revoke_user_grant(
        &self,
        actor: UserId,
        grant_id: GrantId,
        context: &RequestContext,
    ) -> AppResult<()> {
        let actor = self
            .require(actor, AdminPermission::PermissionsManage, context)
            .await?;

        self.repository
            .revoke_user_grant(actor.tenant_id, grant_id)
            .await?;

        self.record(
            &actor,
            AuditAction::SecurityUserGrantRevoked,
            "rbac_user_grant",
            grant_id.to_string(),
            format!("revoked grant '{grant_id}'"),
        )
        .await;

        Ok(())
    }
}
