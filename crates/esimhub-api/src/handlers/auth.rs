//! Registration and login.

use axum::extract::State;
use axum::response::Json;
use serde::Deserialize;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use esimhub_core::models::{Role, UserResponse};
use esimhub_core::AppError;

use crate::auth::{password, token};
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordResetRequestBody {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordResetBody {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Register a new customer account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, HttpAppError> {
    let hash = password::hash(&req.password)?;
    let user = state
        .users
        .create(
            &req.email,
            &hash,
            &req.full_name,
            req.phone_number.as_deref(),
            Role::Customer,
        )
        .await?;

    let token = token::issue(&state.config, &user)?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Authenticate and obtain a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, HttpAppError> {
    // Same error for unknown email and wrong password.
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify(&req.password, &user.password_hash) {
        return Err(invalid().into());
    }
    if !user.is_active {
        return Err(AppError::Forbidden("Account is deactivated".to_string()).into());
    }

    state.users.touch_last_login(user.id).await?;
    let token = token::issue(&state.config, &user)?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Request a password reset token by email.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset-request",
    tag = "auth",
    request_body = PasswordResetRequestBody,
    responses((status = 200, description = "Accepted (whether or not the account exists)"))
)]
#[tracing::instrument(skip(state, req))]
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<PasswordResetRequestBody>,
) -> Result<Json<serde_json::Value>, HttpAppError> {
    state.password_reset.request_reset(&req.email).await?;
    // Uniform response regardless of whether the account exists.
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Reset the password with a previously issued token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset",
    tag = "auth",
    request_body = PasswordResetBody,
    responses(
        (status = 200, description = "Password reset"),
        (status = 400, description = "Invalid or expired token")
    )
)]
#[tracing::instrument(skip(state, req))]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<PasswordResetBody>,
) -> Result<Json<serde_json::Value>, HttpAppError> {
    state
        .password_reset
        .reset_password(&req.token, &req.new_password)
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
