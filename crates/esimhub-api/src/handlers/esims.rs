//! eSIM inventory administration. The whole group is admin-only.
//!
//! Assigned esims are immutable here: modification or deletion would pull
//! an active subscription out from under a fulfilled order, so both are
//! refused until the esim is released.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use esimhub_core::models::{ActionCategory, ActionType, Esim, EsimStatus};
use esimhub_core::AppError;

use crate::auth::CurrentUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct EsimListQuery {
    pub status: Option<EsimStatus>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEsimRequest {
    pub plan_id: Uuid,
    #[validate(length(min = 5, max = 20))]
    pub phone_number: String,
    #[validate(length(min = 10, max = 50))]
    pub iccid: String,
    #[validate(length(min = 1))]
    pub qr_code: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateEsimRequest {
    #[validate(length(min = 10, max = 50))]
    pub iccid: Option<String>,
    #[validate(length(min = 1))]
    pub qr_code: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/esims",
    tag = "esims",
    params(EsimListQuery),
    responses((status = 200, description = "eSIM inventory", body = [Esim]))
)]
pub async fn list_esims(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<EsimListQuery>,
) -> Result<Json<Vec<Esim>>, HttpAppError> {
    user.ensure_admin()?;
    Ok(Json(state.esims.list(query.status).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/esims/{id}",
    tag = "esims",
    params(("id" = Uuid, Path, description = "eSIM ID")),
    responses(
        (status = 200, description = "eSIM", body = Esim),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_esim(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Esim>, HttpAppError> {
    user.ensure_admin()?;
    let esim = state
        .esims
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("eSIM with ID {} not found", id)))?;
    Ok(Json(esim))
}

#[utoipa::path(
    post,
    path = "/api/v1/esims",
    tag = "esims",
    request_body = CreateEsimRequest,
    responses(
        (status = 200, description = "eSIM created", body = Esim),
        (status = 409, description = "Phone number or ICCID already exists")
    )
)]
#[tracing::instrument(skip(state, req), fields(admin_id = %user.id))]
pub async fn create_esim(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateEsimRequest>,
) -> Result<Json<Esim>, HttpAppError> {
    user.ensure_admin()?;
    if state.plans.get(req.plan_id).await?.is_none() {
        return Err(AppError::NotFound("Plan not found".to_string()).into());
    }
    let esim = state
        .esims
        .create(req.plan_id, &req.phone_number, &req.iccid, &req.qr_code)
        .await?;
    state
        .audit
        .record(user.id, ActionCategory::Esim, ActionType::Create, esim.id, None)
        .await;
    Ok(Json(esim))
}

#[utoipa::path(
    patch,
    path = "/api/v1/esims/{id}",
    tag = "esims",
    params(("id" = Uuid, Path, description = "eSIM ID")),
    request_body = UpdateEsimRequest,
    responses(
        (status = 200, description = "eSIM updated", body = Esim),
        (status = 404, description = "Not found"),
        (status = 409, description = "eSIM is assigned")
    )
)]
#[tracing::instrument(skip(state, req), fields(admin_id = %user.id))]
pub async fn update_esim(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateEsimRequest>,
) -> Result<Json<Esim>, HttpAppError> {
    user.ensure_admin()?;
    let existing = state
        .esims
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("eSIM with ID {} not found", id)))?;
    if existing.status == EsimStatus::Assigned {
        return Err(AppError::Conflict("Cannot modify an assigned eSIM".to_string()).into());
    }

    let esim = state
        .esims
        .update(id, req.iccid.as_deref(), req.qr_code.as_deref())
        .await?;
    state
        .audit
        .record(user.id, ActionCategory::Esim, ActionType::Update, esim.id, None)
        .await;
    Ok(Json(esim))
}

#[utoipa::path(
    delete,
    path = "/api/v1/esims/{id}",
    tag = "esims",
    params(("id" = Uuid, Path, description = "eSIM ID")),
    responses(
        (status = 200, description = "eSIM deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "eSIM is assigned or linked to an order")
    )
)]
#[tracing::instrument(skip(state), fields(admin_id = %user.id))]
pub async fn delete_esim(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, HttpAppError> {
    user.ensure_admin()?;
    let existing = state
        .esims
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("eSIM with ID {} not found", id)))?;
    if existing.status == EsimStatus::Assigned {
        return Err(AppError::Conflict("Cannot delete an assigned eSIM".to_string()).into());
    }
    if state.orders.find_by_esim(id).await?.is_some() {
        return Err(
            AppError::Conflict("Cannot delete an eSIM linked to an order".to_string()).into(),
        );
    }

    state.esims.delete(id).await?;
    state
        .audit
        .record(user.id, ActionCategory::Esim, ActionType::Delete, id, None)
        .await;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
