use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// eSIM provider (carrier) entity.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Provider {
    pub id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
}
