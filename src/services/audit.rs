//! Audit trail service
//!
//! Every ledger mutation records who did what. Audit writes never fail the
//! operation that triggered them; a lost audit row is logged and tolerated.

use crate::repository::Repository;

#[derive(Clone)]
pub struct AuditService {
    repository: Repository,
}

impl AuditService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Record a staff action against the audit log
    pub async fn log_action(&self, user_id: i32, action: &str, details: &str) {
        tracing::info!(user_id, action, details, "audit");
        if let Err(e) = self.repository.audit.insert(user_id, action, details).await {
            tracing::warn!("Failed to persist audit entry '{}': {}", action, e);
        }
    }
}
