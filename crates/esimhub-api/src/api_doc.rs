//! OpenAPI documentation. Served at `/api/openapi.json`, browsable at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use esimhub_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "eSIM Hub API",
        version = "0.1.0",
        description = "eSIM marketplace backend: provider/plan catalog, eSIM inventory, \
                       order lifecycle with atomic allocation, favorites, and an admin \
                       audit trail. All endpoints are versioned under /api/v1/."
    ),
    paths(
        handlers::health::health,
        // Auth
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::request_password_reset,
        handlers::auth::reset_password,
        // Accounts
        handlers::users::list_users,
        handlers::users::get_me,
        handlers::users::get_user,
        handlers::users::update_profile,
        handlers::users::change_password,
        handlers::users::activate_user,
        handlers::users::deactivate_user,
        // Providers
        handlers::providers::list_providers,
        handlers::providers::get_provider,
        handlers::providers::create_provider,
        handlers::providers::update_provider,
        handlers::providers::delete_provider,
        // Plans
        handlers::plans::list_plans,
        handlers::plans::get_plan,
        handlers::plans::create_plan,
        handlers::plans::update_plan,
        handlers::plans::delete_plan,
        // eSIM inventory
        handlers::esims::list_esims,
        handlers::esims::get_esim,
        handlers::esims::create_esim,
        handlers::esims::update_esim,
        handlers::esims::delete_esim,
        // Orders
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::get_order_by_number,
        handlers::orders::create_order,
        handlers::orders::update_order,
        handlers::orders::update_payment_status,
        handlers::orders::delete_order,
        // Favorites
        handlers::favorites::list_favorites,
        handlers::favorites::add_favorite,
        handlers::favorites::remove_favorite,
        // Audit trail
        handlers::admin_actions::list_actions,
        handlers::admin_actions::get_action,
    ),
    components(schemas(
        error::ErrorResponse,
        models::Role,
        models::UserResponse,
        models::Provider,
        models::Plan,
        models::Esim,
        models::EsimStatus,
        models::Order,
        models::OrderDetails,
        models::PurchaseStatus,
        models::PaymentStatus,
        models::FavoritePlan,
        models::AdminAction,
        models::ActionCategory,
        models::ActionType,
        handlers::auth::RegisterRequest,
        handlers::auth::LoginRequest,
        handlers::auth::AuthResponse,
        handlers::auth::PasswordResetRequestBody,
        handlers::auth::PasswordResetBody,
        handlers::users::UpdateProfileRequest,
        handlers::users::ChangePasswordRequest,
        handlers::providers::CreateProviderRequest,
        handlers::providers::UpdateProviderRequest,
        handlers::plans::CreatePlanRequest,
        handlers::plans::UpdatePlanRequest,
        handlers::esims::CreateEsimRequest,
        handlers::esims::UpdateEsimRequest,
        handlers::orders::CreateOrderRequest,
        handlers::orders::UpdateOrderRequest,
        handlers::orders::UpdatePaymentRequest,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Registration, login, and password reset"),
        (name = "users", description = "Account management"),
        (name = "providers", description = "Provider catalog"),
        (name = "plans", description = "Plan catalog"),
        (name = "esims", description = "eSIM inventory administration"),
        (name = "orders", description = "Order lifecycle and payment transitions"),
        (name = "favorites", description = "Customer plan bookmarks"),
        (name = "admin", description = "Admin audit trail")
    )
)]
pub struct ApiDoc;
