use axum::extract::State;
use axum::response::Json;
use std::sync::Arc;

use crate::error::HttpAppError;
use crate::state::AppState;

/// Liveness and database connectivity check.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Database unreachable")
    )
)]
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, HttpAppError> {
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map_err(esimhub_core::AppError::from)?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
