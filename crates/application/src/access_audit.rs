use std::sync::Arc;

use scopegate_core::{TenantId, UserId};
use scopegate_domain::{AccessDecision, PermissionCheck, RequestContext};

use crate::{AccessAuditEntry, AuditEvent, AuditRepository};

/// Append-only writer for access decisions that never fails its caller.
#[derive(Clone)]
pub struct AuditLogger {
    repository: Arc<dyn AuditRepository>,
}

impl AuditLogger {
    /// Creates a logger over an audit repository.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditRepository>) -> Self {
        Self { repository }
    }

    /// Persists one access entry; store failures are reported and swallowed.
    pub async fn log_access(&self, entry: AccessAuditEntry) {
        let user_id = entry.user_id;
        let resource = entry.resource.clone();
        let action = entry.action.clone();

        if let Err(error) = self.repository.append_access_entry(entry).await {
            tracing::error!(
                %error,
                %user_id,
                resource = %resource,
                action = %action,
                "failed to persist access audit entry"
            );
        }
    }

    /// Persists the decision made for one check.
    pub async fn log_decision(
        &self,
        user_id: UserId,
        tenant_id: Option<TenantId>,
        check: &PermissionCheck,
        context: &RequestContext,
        decision: &AccessDecision,
    ) {
        self.log_access(AccessAuditEntry {
            user_id,
            tenant_id,
            resource: check.resource.clone(),
            action: check.action.clone(),
            resource_id: check.resource_id.clone(),
            result: decision.result,
            reason: decision.reason.clone(),
            ip_address: context.ip_address,
            user_agent: context.user_agent.clone(),
            context: decision.audit_context(),
            occurred_at: context.requested_at,
        })
        .await;
    }

    /// Persists an administration event; store failures are reported and swallowed.
    pub async fn log_event(&self, event: AuditEvent) {
        let action = event.action.as_str();
        let tenant_id = event.tenant_id;

        if let Err(error) = self.repository.append_event(event).await {
            tracing::error!(%error, %tenant_id, action, "failed to persist audit event");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use scopegate_core::{AppError, AppResult, UserId};
    use scopegate_domain::{AccessDecision, AccessResult, PermissionCheck, RequestContext};
    use tokio::sync::Mutex;

    use super::AuditLogger;
    use crate::{AccessAuditEntry, AuditEvent, AuditRepository};

    #[derive(Default)]
    struct FlakyAuditRepository {
        fail: bool,
        entries: Mutex<Vec<AccessAuditEntry>>,
    }

    #[async_trait]
    impl AuditRepository for FlakyAuditRepository {
        async fn append_event(&self, _event: AuditEvent) -> AppResult<()> {
            Ok(())
        }

        async fn append_access_entry(&self, entry: AccessAuditEntry) -> AppResult<()> {
            if self.fail {
                return Err(AppError::Internal("audit store offline".to_owned()));
            }
            self.entries.lock().await.push(entry);
            Ok(())
        }
    }

    #[tokio::test]
    async fn decision_is_persisted_with_context() {
        let repository = Arc::new(FlakyAuditRepository::default());
        let logger = AuditLogger::new(repository.clone());
        let check = PermissionCheck::new("students", "read").unwrap_or_else(|_| unreachable!());
        let decision = AccessDecision::deny(AccessResult::Denied, "insufficient permissions", Vec::new());

        logger
            .log_decision(UserId::new(), None, &check, &RequestContext::now(), &decision)
            .await;

        let entries = repository.entries.lock().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].result, AccessResult::Denied);
        assert_eq!(entries[0].resource, "students");
    }

    #[tokio::test]
    async fn store_failure_is_swallowed() {
        let repository = Arc::new(FlakyAuditRepository {
            fail: true,
            entries: Mutex::new(Vec::new()),
        });
        let logger = AuditLogger::new(repository.clone());
        let check = PermissionCheck::new("students", "read").unwrap_or_else(|_| unreachable!());
        let decision = AccessDecision::allow("granted", Vec::new());

        logger
            .log_decision(UserId::new(), None, &check, &RequestContext::now(), &decision)
            .await;

        assert!(repository.entries.lock().await.is_empty());
    }
}
