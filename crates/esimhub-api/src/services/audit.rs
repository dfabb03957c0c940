//! Admin action audit trail.

use esimhub_core::models::{ActionCategory, ActionType};
use esimhub_db::AdminActionRepository;
use uuid::Uuid;

/// Records admin mutations. Recording failures are logged and swallowed:
/// the audited operation must never fail because the trail could not be
/// written.
#[derive(Clone)]
pub struct AuditService {
    repository: AdminActionRepository,
}

impl AuditService {
    pub fn new(repository: AdminActionRepository) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &AdminActionRepository {
        &self.repository
    }

    pub async fn record(
        &self,
        admin_id: Uuid,
        category: ActionCategory,
        action: ActionType,
        entity_id: Uuid,
        notes: Option<&str>,
    ) {
        if let Err(err) = self
            .repository
            .record(admin_id, category, action, entity_id, notes)
            .await
        {
            tracing::warn!(
                error = %err,
                admin_id = %admin_id,
                category = %category,
                entity_id = %entity_id,
                "Failed to record admin action"
            );
        }
    }
}
