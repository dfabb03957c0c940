//! Account management. Listing and activation control are admin-only;
//! profile and password changes act on the caller's own account.

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use esimhub_core::models::{ActionCategory, ActionType, UserResponse};
use esimhub_core::AppError;

use crate::auth::{password, CurrentUser};
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(length(min = 5, max = 20))]
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    responses((status = 200, description = "All accounts", body = [UserResponse]))
)]
pub async fn list_users(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, HttpAppError> {
    user.ensure_admin()?;
    let users = state.users.list_all().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "users",
    responses((status = 200, description = "Caller's account", body = UserResponse))
)]
pub async fn get_me(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<UserResponse>, HttpAppError> {
    let account = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account", body = UserResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_user(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, HttpAppError> {
    user.ensure_admin()?;
    let account = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with ID {} not found", id)))?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/me/profile",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Profile updated", body = UserResponse))
)]
#[tracing::instrument(skip(state, req), fields(user_id = %user.id))]
pub async fn update_profile(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, HttpAppError> {
    let account = state
        .users
        .update_profile(user.id, req.full_name.as_deref(), req.phone_number.as_deref())
        .await?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/me/password",
    tag = "users",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 401, description = "Current password is incorrect")
    )
)]
#[tracing::instrument(skip(state, req), fields(user_id = %user.id))]
pub async fn change_password(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, HttpAppError> {
    let account = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

    if !password::verify(&req.current_password, &account.password_hash) {
        return Err(AppError::Unauthorized("Current password is incorrect".to_string()).into());
    }

    let hash = password::hash(&req.new_password)?;
    state.users.update_password(user.id, &hash).await?;
    Ok(Json(serde_json::json!({ "message": "Password changed successfully" })))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}/activate",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account activated", body = UserResponse),
        (status = 400, description = "Already active"),
        (status = 404, description = "Not found")
    )
)]
#[tracing::instrument(skip(state), fields(admin_id = %user.id))]
pub async fn activate_user(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, HttpAppError> {
    user.ensure_admin()?;
    set_account_active(&user, &state, id, true).await
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}/deactivate",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account deactivated", body = UserResponse),
        (status = 400, description = "Already inactive"),
        (status = 404, description = "Not found")
    )
)]
#[tracing::instrument(skip(state), fields(admin_id = %user.id))]
pub async fn deactivate_user(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, HttpAppError> {
    user.ensure_admin()?;
    set_account_active(&user, &state, id, false).await
}

async fn set_account_active(
    admin: &CurrentUser,
    state: &AppState,
    id: Uuid,
    active: bool,
) -> Result<Json<UserResponse>, HttpAppError> {
    let account = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with ID {} not found", id)))?;
    if account.is_active == active {
        let msg = if active {
            "User is already active"
        } else {
            "User is already inactive"
        };
        return Err(AppError::BadRequest(msg.to_string()).into());
    }

    let updated = state.users.set_active(id, active).await?;
    state
        .audit
        .record(
            admin.id,
            ActionCategory::Customer,
            ActionType::Update,
            id,
            Some(if active { "activated" } else { "deactivated" }),
        )
        .await;
    Ok(Json(updated.into()))
}
