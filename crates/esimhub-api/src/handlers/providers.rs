//! Provider catalog: reads for any authenticated user, mutations admin-only
//! and audited.

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use esimhub_core::models::{ActionCategory, ActionType, Provider};
use esimhub_core::AppError;
use esimhub_db::ProviderPatch;

use crate::auth::CurrentUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProviderRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(url)]
    pub logo_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProviderRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(url)]
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/api/v1/providers",
    tag = "providers",
    responses((status = 200, description = "All providers", body = [Provider]))
)]
pub async fn list_providers(
    _user: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Provider>>, HttpAppError> {
    Ok(Json(state.providers.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/providers/{id}",
    tag = "providers",
    params(("id" = Uuid, Path, description = "Provider ID")),
    responses(
        (status = 200, description = "Provider", body = Provider),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_provider(
    _user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Provider>, HttpAppError> {
    let provider = state
        .providers
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Provider with ID {} not found", id)))?;
    Ok(Json(provider))
}

#[utoipa::path(
    post,
    path = "/api/v1/providers",
    tag = "providers",
    request_body = CreateProviderRequest,
    responses(
        (status = 200, description = "Provider created", body = Provider),
        (status = 409, description = "Name already exists")
    )
)]
#[tracing::instrument(skip(state, req), fields(admin_id = %user.id))]
pub async fn create_provider(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateProviderRequest>,
) -> Result<Json<Provider>, HttpAppError> {
    user.ensure_admin()?;
    let provider = state
        .providers
        .create(&req.name, req.logo_url.as_deref(), req.description.as_deref())
        .await?;
    state
        .audit
        .record(
            user.id,
            ActionCategory::Provider,
            ActionType::Create,
            provider.id,
            None,
        )
        .await;
    Ok(Json(provider))
}

#[utoipa::path(
    patch,
    path = "/api/v1/providers/{id}",
    tag = "providers",
    params(("id" = Uuid, Path, description = "Provider ID")),
    request_body = UpdateProviderRequest,
    responses(
        (status = 200, description = "Provider updated", body = Provider),
        (status = 404, description = "Not found")
    )
)]
#[tracing::instrument(skip(state, req), fields(admin_id = %user.id))]
pub async fn update_provider(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateProviderRequest>,
) -> Result<Json<Provider>, HttpAppError> {
    user.ensure_admin()?;
    let provider = state
        .providers
        .update(
            id,
            ProviderPatch {
                name: req.name,
                logo_url: req.logo_url,
                description: req.description,
                is_active: req.is_active,
            },
        )
        .await?;
    state
        .audit
        .record(
            user.id,
            ActionCategory::Provider,
            ActionType::Update,
            provider.id,
            None,
        )
        .await;
    Ok(Json(provider))
}

#[utoipa::path(
    delete,
    path = "/api/v1/providers/{id}",
    tag = "providers",
    params(("id" = Uuid, Path, description = "Provider ID")),
    responses(
        (status = 200, description = "Provider deleted"),
        (status = 404, description = "Not found")
    )
)]
#[tracing::instrument(skip(state), fields(admin_id = %user.id))]
pub async fn delete_provider(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, HttpAppError> {
    user.ensure_admin()?;
    if !state.providers.delete(id).await? {
        return Err(AppError::NotFound(format!("Provider with ID {} not found", id)).into());
    }
    state
        .audit
        .record(user.id, ActionCategory::Provider, ActionType::Delete, id, None)
        .await;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
