use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// Inventory status of an eSIM.
///
/// An esim is `Assigned` iff exactly one order currently binds it; the
/// `orders.esim_id` unique constraint enforces the "one order" half.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, sqlx::Type)]
#[sqlx(type_name = "esim_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EsimStatus {
    Available,
    Assigned,
    Expired,
}

impl Display for EsimStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            EsimStatus::Available => write!(f, "available"),
            EsimStatus::Assigned => write!(f, "assigned"),
            EsimStatus::Expired => write!(f, "expired"),
        }
    }
}

/// Provisioned, allocatable mobile-subscription record tied to one plan.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Esim {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub phone_number: String,
    pub iccid: String,
    pub qr_code: String,
    pub status: EsimStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
