//! Customer plan bookmarks.

use axum::extract::{Path, State};
use axum::response::Json;
use std::sync::Arc;
use uuid::Uuid;

use esimhub_core::models::FavoritePlan;
use esimhub_core::AppError;

use crate::auth::CurrentUser;
use crate::error::HttpAppError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/favorites",
    tag = "favorites",
    responses((status = 200, description = "Caller's favorite plans", body = [FavoritePlan]))
)]
pub async fn list_favorites(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FavoritePlan>>, HttpAppError> {
    Ok(Json(state.favorites.list(user.id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/favorites/{plan_id}",
    tag = "favorites",
    params(("plan_id" = Uuid, Path, description = "Plan ID")),
    responses(
        (status = 200, description = "Plan added to favorites", body = FavoritePlan),
        (status = 404, description = "Plan not found"),
        (status = 409, description = "Already in favorites")
    )
)]
pub async fn add_favorite(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<FavoritePlan>, HttpAppError> {
    Ok(Json(state.favorites.add(user.id, plan_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/favorites/{plan_id}",
    tag = "favorites",
    params(("plan_id" = Uuid, Path, description = "Plan ID")),
    responses(
        (status = 200, description = "Plan removed from favorites"),
        (status = 404, description = "Not in favorites")
    )
)]
pub async fn remove_favorite(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, HttpAppError> {
    if !state.favorites.remove(user.id, plan_id).await? {
        return Err(AppError::NotFound("Plan is not in favorites".to_string()).into());
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}
