//! Route assembly: public and authenticated route groups under `/api/v1`,
//! plus docs and layers. Role checks live in the handlers
//! (`CurrentUser::ensure_admin`); the middleware here only establishes
//! identity.

use anyhow::Result;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, patch, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use esimhub_core::Config;

use crate::api_doc::ApiDoc;
use crate::auth::middleware::auth_middleware;
use crate::constants;
use crate::handlers;
use crate::state::AppState;

pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router> {
    let cors = setup_cors(config)?;

    let api = public_routes().merge(authenticated_routes().layer(
        axum::middleware::from_fn_with_state(state.clone(), auth_middleware),
    ));

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .nest(constants::API_PREFIX, api)
        .route(
            "/api/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(RequestBodyLimitLayer::new(constants::MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// No authentication required.
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/auth/password-reset-request",
            post(handlers::auth::request_password_reset),
        )
        .route("/auth/password-reset", post(handlers::auth::reset_password))
}

/// Everything behind the bearer token, admin-only operations included.
fn authenticated_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(handlers::users::list_users))
        .route("/users/me", get(handlers::users::get_me))
        .route("/users/me/profile", patch(handlers::users::update_profile))
        .route("/users/me/password", patch(handlers::users::change_password))
        .route("/users/{id}", get(handlers::users::get_user))
        .route("/users/{id}/activate", patch(handlers::users::activate_user))
        .route(
            "/users/{id}/deactivate",
            patch(handlers::users::deactivate_user),
        )
        .route(
            "/providers",
            get(handlers::providers::list_providers).post(handlers::providers::create_provider),
        )
        .route(
            "/providers/{id}",
            get(handlers::providers::get_provider)
                .patch(handlers::providers::update_provider)
                .delete(handlers::providers::delete_provider),
        )
        .route(
            "/plans",
            get(handlers::plans::list_plans).post(handlers::plans::create_plan),
        )
        .route(
            "/plans/{id}",
            get(handlers::plans::get_plan)
                .patch(handlers::plans::update_plan)
                .delete(handlers::plans::delete_plan),
        )
        .route(
            "/esims",
            get(handlers::esims::list_esims).post(handlers::esims::create_esim),
        )
        .route(
            "/esims/{id}",
            get(handlers::esims::get_esim)
                .patch(handlers::esims::update_esim)
                .delete(handlers::esims::delete_esim),
        )
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route(
            "/orders/{id}",
            get(handlers::orders::get_order)
                .patch(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        )
        .route(
            "/orders/number/{order_number}",
            get(handlers::orders::get_order_by_number),
        )
        .route(
            "/orders/{id}/payment",
            patch(handlers::orders::update_payment_status),
        )
        .route("/favorites", get(handlers::favorites::list_favorites))
        .route(
            "/favorites/{plan_id}",
            post(handlers::favorites::add_favorite).delete(handlers::favorites::remove_favorite),
        )
        .route("/admin/actions", get(handlers::admin_actions::list_actions))
        .route(
            "/admin/actions/{id}",
            get(handlers::admin_actions::get_action),
        )
}

fn setup_cors(config: &Config) -> Result<CorsLayer> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
