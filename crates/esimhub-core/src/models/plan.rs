use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Purchasable service tier offered by a provider.
///
/// `price` is copied onto orders at creation time; later edits never touch
/// existing orders.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub name: String,
    pub data_amount_gb: i32,
    pub call_minutes: i32,
    pub sms_count: i32,
    pub validity_days: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub description: Option<String>,
    pub is_active: bool,
}
