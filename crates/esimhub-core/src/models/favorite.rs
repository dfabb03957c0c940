use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A customer's bookmarked plan. (customer_id, plan_id) is unique.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct FavoritePlan {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub added_at: DateTime<Utc>,
}
