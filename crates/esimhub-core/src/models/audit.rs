use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// Entity class an admin action touched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, sqlx::Type)]
#[sqlx(type_name = "action_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    Esim,
    Plan,
    Provider,
    Customer,
    Purchase,
}

impl Display for ActionCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ActionCategory::Esim => write!(f, "esim"),
            ActionCategory::Plan => write!(f, "plan"),
            ActionCategory::Provider => write!(f, "provider"),
            ActionCategory::Customer => write!(f, "customer"),
            ActionCategory::Purchase => write!(f, "purchase"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, sqlx::Type)]
#[sqlx(type_name = "action_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Create,
    Update,
    Delete,
}

/// Audit trail record for admin mutations of catalog/inventory/orders.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct AdminAction {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub category: ActionCategory,
    pub action: ActionType,
    pub entity_id: Uuid,
    pub notes: Option<String>,
    pub performed_at: DateTime<Utc>,
}
