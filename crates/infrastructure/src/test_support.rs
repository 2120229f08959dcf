//! Shared PostgreSQL fixtures for repository tests.

use scopegate_core::{BranchId, TenantId, UserId};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connects to `DATABASE_URL` and applies migrations; `None` skips the test.
pub(crate) async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres rbac tests: {error}");
    }

    Some(pool)
}

pub(crate) async fn ensure_tenant(pool: &PgPool, tenant_id: TenantId, name: &str) {
    let insert = sqlx::query(
        r#"
            INSERT INTO tenants (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(name)
    .execute(pool)
    .await;

    assert!(insert.is_ok());
}

pub(crate) async fn ensure_branch(
    pool: &PgPool,
    tenant_id: TenantId,
    parent_branch_id: Option<BranchId>,
    name: &str,
) -> BranchId {
    let branch_id = BranchId::new();
    let insert = sqlx::query(
        r#"
            INSERT INTO branches (id, tenant_id, parent_branch_id, name)
            VALUES ($1, $2, $3, $4)
            "#,
    )
    .bind(branch_id.as_uuid())
    .bind(tenant_id.as_uuid())
    .bind(parent_branch_id.map(|branch_id| branch_id.as_uuid()))
    .bind(name)
    .execute(pool)
    .await;

    assert!(insert.is_ok());
    branch_id
}

pub(crate) async fn ensure_principal(
    pool: &PgPool,
    tenant_id: TenantId,
    branch_id: Option<BranchId>,
    legacy_role: Option<&str>,
) -> UserId {
    let user_id = UserId::new();
    let insert = sqlx::query(
        r#"
            INSERT INTO principals (id, tenant_id, branch_id, status, legacy_role)
            VALUES ($1, $2, $3, 'active', $4)
            "#,
    )
    .bind(user_id.as_uuid())
    .bind(tenant_id.as_uuid())
    .bind(branch_id.map(|branch_id| branch_id.as_uuid()))
    .bind(legacy_role)
    .execute(pool)
    .await;

    assert!(insert.is_ok());
    user_id
}
