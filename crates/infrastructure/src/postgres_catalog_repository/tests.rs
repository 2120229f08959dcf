use scopegate_application::CatalogRepository;
use scopegate_core::{RoleId, TenantId};
use scopegate_domain::{Role, RoleInput, ScopeTag, list_default_permissions};

use super::PostgresCatalogRepository;
use crate::test_support::{ensure_tenant, test_pool};

#[tokio::test]
async fn permission_seeding_is_idempotent() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresCatalogRepository::new(pool);
    let permissions = list_default_permissions().unwrap_or_default();
    assert!(!permissions.is_empty());

    assert!(
        repository
            .insert_permissions_if_absent(&permissions)
            .await
            .is_ok()
    );
    let second = repository.insert_permissions_if_absent(&permissions).await;
    assert_eq!(second.unwrap_or(usize::MAX), 0);

    let listed = repository.list_permissions().await.unwrap_or_default();
    assert!(
        permissions
            .iter()
            .all(|permission| listed.iter().any(|stored| stored.key() == permission.key()))
    );
}

#[tokio::test]
async fn insert_role_if_absent_keeps_the_first_role() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresCatalogRepository::new(pool.clone());
    let tenant_id = TenantId::new();
    ensure_tenant(&pool, tenant_id, "Catalog Tenant").await;

    let build = |name: &str| {
        Role::new(
            RoleId::new(),
            RoleInput {
                tenant_id: Some(tenant_id),
                slug: "accountant".to_owned(),
                name: name.to_owned(),
                level: 35,
                scope: ScopeTag::Agency,
                branch_id: None,
                parent_role_id: None,
                grants: Vec::new(),
            },
        )
        .unwrap_or_else(|_| unreachable!())
    };

    let first = build("Accountant");
    assert!(repository.insert_role_if_absent(&first).await.unwrap_or(false));
    assert!(!repository.insert_role_if_absent(&build("Second")).await.unwrap_or(true));

    let stored = repository
        .find_role_by_slug(Some(tenant_id), "accountant")
        .await
        .unwrap_or_default();
    assert_eq!(stored.map(|role| role.id()), Some(first.id()));

    let system = repository
        .find_role_by_slug(None, "accountant")
        .await
        .unwrap_or_default();
    assert!(system.is_none());
}
