use scopegate_core::{AppError, TenantId};
use tracing::info;

use crate::state::AppState;

/// Seeds the permission catalog and system roles, then bootstraps configured tenants.
pub async fn seed_rbac(state: &AppState, tenant_ids: &[TenantId]) -> Result<(), AppError> {
    let summary = state.catalog_service.initialize_rbac().await?;
    info!(
        permissions_created = summary.permissions_created,
        roles_created = summary.roles_created.len(),
        "rbac catalog initialized"
    );

    for tenant_id in tenant_ids {
        let summary = state.catalog_service.bootstrap_tenant(*tenant_id).await?;
        info!(
            %tenant_id,
            roles_created = ?summary.roles_created,
            "tenant rbac bootstrapped"
        );
    }

    Ok(())
}
