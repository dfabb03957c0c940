//! Plan catalog.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use esimhub_core::models::{ActionCategory, ActionType, Plan};
use esimhub_core::AppError;
use esimhub_db::{NewPlan, PlanPatch};

use crate::auth::CurrentUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct PlanListQuery {
    /// When true, only active plans are returned.
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePlanRequest {
    pub provider_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 1))]
    pub data_amount_gb: i32,
    #[validate(range(min = 0))]
    pub call_minutes: Option<i32>,
    #[validate(range(min = 0))]
    pub sms_count: Option<i32>,
    #[validate(range(min = 1))]
    pub validity_days: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePlanRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(range(min = 1))]
    pub data_amount_gb: Option<i32>,
    #[validate(range(min = 0))]
    pub call_minutes: Option<i32>,
    #[validate(range(min = 0))]
    pub sms_count: Option<i32>,
    #[validate(range(min = 1))]
    pub validity_days: Option<i32>,
    #[schema(value_type = String)]
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/api/v1/plans",
    tag = "plans",
    params(PlanListQuery),
    responses((status = 200, description = "Plans", body = [Plan]))
)]
pub async fn list_plans(
    _user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlanListQuery>,
) -> Result<Json<Vec<Plan>>, HttpAppError> {
    Ok(Json(state.plans.list(query.active.unwrap_or(false)).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/plans/{id}",
    tag = "plans",
    params(("id" = Uuid, Path, description = "Plan ID")),
    responses(
        (status = 200, description = "Plan", body = Plan),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_plan(
    _user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Plan>, HttpAppError> {
    let plan = state
        .plans
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plan with ID {} not found", id)))?;
    Ok(Json(plan))
}

#[utoipa::path(
    post,
    path = "/api/v1/plans",
    tag = "plans",
    request_body = CreatePlanRequest,
    responses(
        (status = 200, description = "Plan created", body = Plan),
        (status = 404, description = "Provider not found")
    )
)]
#[tracing::instrument(skip(state, req), fields(admin_id = %user.id))]
pub async fn create_plan(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreatePlanRequest>,
) -> Result<Json<Plan>, HttpAppError> {
    user.ensure_admin()?;
    let plan = state
        .plans
        .create(NewPlan {
            provider_id: req.provider_id,
            name: req.name,
            data_amount_gb: req.data_amount_gb,
            call_minutes: req.call_minutes.unwrap_or(0),
            sms_count: req.sms_count.unwrap_or(0),
            validity_days: req.validity_days,
            price: req.price,
            description: req.description,
        })
        .await?;
    state
        .audit
        .record(user.id, ActionCategory::Plan, ActionType::Create, plan.id, None)
        .await;
    Ok(Json(plan))
}

#[utoipa::path(
    patch,
    path = "/api/v1/plans/{id}",
    tag = "plans",
    params(("id" = Uuid, Path, description = "Plan ID")),
    request_body = UpdatePlanRequest,
    responses(
        (status = 200, description = "Plan updated", body = Plan),
        (status = 404, description = "Not found")
    )
)]
#[tracing::instrument(skip(state, req), fields(admin_id = %user.id))]
pub async fn update_plan(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdatePlanRequest>,
) -> Result<Json<Plan>, HttpAppError> {
    user.ensure_admin()?;
    let plan = state
        .plans
        .update(
            id,
            PlanPatch {
                name: req.name,
                data_amount_gb: req.data_amount_gb,
                call_minutes: req.call_minutes,
                sms_count: req.sms_count,
                validity_days: req.validity_days,
                price: req.price,
                description: req.description,
                is_active: req.is_active,
            },
        )
        .await?;
    state
        .audit
        .record(user.id, ActionCategory::Plan, ActionType::Update, plan.id, None)
        .await;
    Ok(Json(plan))
}

#[utoipa::path(
    delete,
    path = "/api/v1/plans/{id}",
    tag = "plans",
    params(("id" = Uuid, Path, description = "Plan ID")),
    responses(
        (status = 200, description = "Plan deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Plan has orders")
    )
)]
#[tracing::instrument(skip(state), fields(admin_id = %user.id))]
pub async fn delete_plan(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, HttpAppError> {
    user.ensure_admin()?;
    if !state.plans.delete(id).await? {
        return Err(AppError::NotFound(format!("Plan with ID {} not found", id)).into());
    }
    state
        .audit
        .record(user.id, ActionCategory::Plan, ActionType::Delete, id, None)
        .await;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
