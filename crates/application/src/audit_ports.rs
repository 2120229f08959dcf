use std::net::IpAddr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scopegate_core::{AppResult, TenantId, UserId};
use scopegate_domain::{AccessResult, AuditAction};
use serde_json::Value;

/// Immutable audit event payload emitted by administration use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Tenant scope for the event.
    pub tenant_id: TenantId,
    /// Subject that performed the action.
    pub subject: String,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Optional audit detail payload.
    pub detail: Option<String>,
}

/// One access decision as persisted in the access log.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessAuditEntry {
    /// Principal the decision was made for.
    pub user_id: UserId,
    /// Principal tenant; `None` when the principal could not be loaded.
    pub tenant_id: Option<TenantId>,
    /// Requested resource.
    pub resource: String,
    /// Requested action.
    pub action: String,
    /// Concrete instance, when the check targeted one.
    pub resource_id: Option<String>,
    /// Decision category.
    pub result: AccessResult,
    /// Decision reason.
    pub reason: String,
    /// Client address.
    pub ip_address: Option<IpAddr>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Scope, branches, applied rules, field permissions and data filter.
    pub context: Value,
    /// Evaluation instant.
    pub occurred_at: DateTime<Utc>,
}

/// Port for persisting append-only audit records.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one administration audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;

    /// Persists one access decision.
    async fn append_access_entry(&self, entry: AccessAuditEntry) -> AppResult<()>;
}
