//! Order endpoints. Creation and reads are customer-facing; patching,
//! payment transitions, and deletion are admin-only.

use axum::extract::{Path, State};
use axum::response::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use esimhub_core::models::{
    ActionCategory, ActionType, Order, OrderDetails, PaymentStatus, PurchaseStatus,
};
use esimhub_core::AppError;
use esimhub_db::OrderPatch;

use crate::auth::CurrentUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::services::fulfillment::CreateOrder;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub plan_id: Uuid,
    #[validate(length(min = 1, max = 20))]
    pub payment_method: Option<String>,
    pub activation_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderRequest {
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub purchase_status: Option<PurchaseStatus>,
    #[validate(length(min = 1, max = 20))]
    pub payment_method: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub payment_reference: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub transaction_id: Option<String>,
    pub activation_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePaymentRequest {
    pub payment_status: PaymentStatus,
    #[validate(length(max = 100))]
    pub transaction_id: Option<String>,
    #[validate(length(max = 100))]
    pub payment_reference: Option<String>,
}

/// Load an order, enforcing that non-admin callers only see their own.
async fn load_order_for(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
) -> Result<Order, AppError> {
    let order = state
        .orders
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order with ID {} not found", id)))?;
    if !user.is_admin() && order.customer_id != user.id {
        // Do not reveal whether someone else's order exists.
        return Err(AppError::NotFound(format!("Order with ID {} not found", id)));
    }
    Ok(order)
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    tag = "orders",
    responses((status = 200, description = "Orders (all for admins, own for customers)", body = [Order]))
)]
pub async fn list_orders(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Order>>, HttpAppError> {
    let orders = if user.is_admin() {
        state.orders.list_all().await?
    } else {
        state.orders.list_by_customer(user.id).await?
    };
    Ok(Json(orders))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with bound eSIM", body = OrderDetails),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_order(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetails>, HttpAppError> {
    let order = load_order_for(&state, &user, id).await?;
    Ok(Json(state.fulfillment.order_details(order).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/number/{order_number}",
    tag = "orders",
    params(("order_number" = String, Path, description = "Order number")),
    responses(
        (status = 200, description = "Order with bound eSIM", body = OrderDetails),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_order_by_number(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(order_number): Path<String>,
) -> Result<Json<OrderDetails>, HttpAppError> {
    let order = state
        .orders
        .find_by_order_number(&order_number)
        .await?
        .filter(|o| user.is_admin() || o.customer_id == user.id)
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_number)))?;
    Ok(Json(state.fulfillment.order_details(order).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    tag = "orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created (payment pending)", body = Order),
        (status = 404, description = "Plan not found"),
        (status = 409, description = "No available eSIMs for the plan")
    )
)]
#[tracing::instrument(skip(state, req), fields(customer_id = %user.id))]
pub async fn create_order(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateOrderRequest>,
) -> Result<Json<Order>, HttpAppError> {
    let order = state
        .fulfillment
        .create_order(CreateOrder {
            customer_id: user.id,
            plan_id: req.plan_id,
            payment_method: req.payment_method,
            activation_date: req.activation_date,
        })
        .await?;
    Ok(Json(order))
}

#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = Order),
        (status = 404, description = "Not found")
    )
)]
#[tracing::instrument(skip(state, req), fields(admin_id = %user.id))]
pub async fn update_order(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateOrderRequest>,
) -> Result<Json<Order>, HttpAppError> {
    user.ensure_admin()?;
    let order = state
        .orders
        .update_fields(
            id,
            OrderPatch {
                amount: req.amount,
                currency: req.currency,
                purchase_status: req.purchase_status,
                payment_method: req.payment_method,
                payment_reference: req.payment_reference,
                transaction_id: req.transaction_id,
                activation_date: req.activation_date,
                expiry_date: req.expiry_date,
            },
        )
        .await?;
    state
        .audit
        .record(user.id, ActionCategory::Purchase, ActionType::Update, order.id, None)
        .await;
    Ok(Json(order))
}

/// Apply a payment status transition.
///
/// `completed` atomically claims an eSIM for the order's plan; `refunded` /
/// `failed` release a bound eSIM. Exhausted inventory returns 409 and
/// leaves the payment status unchanged.
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/payment",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Transition applied", body = Order),
        (status = 400, description = "Invalid transition or missing transaction ID"),
        (status = 404, description = "Not found"),
        (status = 409, description = "No available eSIMs; payment status not applied")
    )
)]
#[tracing::instrument(skip(state, req), fields(admin_id = %user.id, order_id = %id))]
pub async fn update_payment_status(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdatePaymentRequest>,
) -> Result<Json<Order>, HttpAppError> {
    user.ensure_admin()?;
    let order = state
        .fulfillment
        .apply_payment_status(
            id,
            req.payment_status,
            req.transaction_id.as_deref(),
            req.payment_reference.as_deref(),
        )
        .await?;
    state
        .audit
        .record(
            user.id,
            ActionCategory::Purchase,
            ActionType::Update,
            order.id,
            Some(&format!("payment_status -> {}", req.payment_status)),
        )
        .await;
    Ok(Json(order))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order deleted, bound eSIM released"),
        (status = 404, description = "Not found")
    )
)]
#[tracing::instrument(skip(state), fields(admin_id = %user.id))]
pub async fn delete_order(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, HttpAppError> {
    user.ensure_admin()?;
    state.fulfillment.delete_order(id).await?;
    state
        .audit
        .record(user.id, ActionCategory::Purchase, ActionType::Delete, id, None)
        .await;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
