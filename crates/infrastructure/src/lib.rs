//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_rbac_store;
mod postgres_audit_repository;
mod postgres_authorization_repository;
mod postgres_catalog_repository;
mod postgres_security_admin_repository;
mod rbac_rows;

#[cfg(test)]
mod test_support;

pub use in_memory_rbac_store::InMemoryRbacStore;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_catalog_repository::PostgresCatalogRepository;
pub use postgres_security_admin_repository::PostgresSecurityAdminRepository;
