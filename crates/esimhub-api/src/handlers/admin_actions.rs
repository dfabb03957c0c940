//! Read access to the admin audit trail (admin-only).

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

use esimhub_core::models::{ActionCategory, AdminAction};
use esimhub_core::AppError;

use crate::auth::CurrentUser;
use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct AdminActionQuery {
    pub category: Option<ActionCategory>,
    pub admin_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/actions",
    tag = "admin",
    params(AdminActionQuery),
    responses((status = 200, description = "Audit records, newest first", body = [AdminAction]))
)]
pub async fn list_actions(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminActionQuery>,
) -> Result<Json<Vec<AdminAction>>, HttpAppError> {
    user.ensure_admin()?;
    let actions = state
        .audit
        .repository()
        .list(query.category, query.admin_id)
        .await?;
    Ok(Json(actions))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/actions/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Audit record ID")),
    responses(
        (status = 200, description = "Audit record", body = AdminAction),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_action(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminAction>, HttpAppError> {
    user.ensure_admin()?;
    let action = state
        .audit
        .repository()
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Admin action with ID {} not found", id)))?;
    Ok(Json(action))
}
