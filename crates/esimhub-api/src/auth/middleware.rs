//! Bearer-token authentication middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use esimhub_core::AppError;
use std::sync::Arc;

use crate::auth::models::CurrentUser;
use crate::auth::token;
use crate::error::HttpAppError;
use crate::state::AppState;

/// Verify the `Authorization: Bearer <jwt>` header and attach the caller
/// identity to request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token_str) = header.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::Unauthorized(
            "Authorization header must be a bearer token".to_string(),
        ))
        .into_response();
    };

    let claims = match token::verify(&state.config, token_str) {
        Ok(claims) => claims,
        Err(err) => return HttpAppError(err).into_response(),
    };

    request.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    });

    next.run(request).await
}
