//! Order lifecycle engine: creation, payment state machine, and the atomic
//! inventory claim/release that goes with it.
//!
//! This is the only code path that moves an esim between `available` and
//! `assigned` in connection with an order. Allocation (or release) and the
//! payment status write always share one database transaction, so a payment
//! state is only ever persisted together with the inventory effect it
//! implies.

use chrono::{DateTime, Duration, Utc};
use esimhub_core::models::{
    generate_order_number, Esim, Order, OrderDetails, PaymentStatus, PurchaseStatus,
};
use esimhub_core::AppError;
use esimhub_db::{EsimRepository, NewOrder, OrderRepository, PlanRepository, UserRepository};
use sqlx::PgPool;
use uuid::Uuid;

use crate::services::email::EmailService;

const DEFAULT_CURRENCY: &str = "EUR";
const DEFAULT_PAYMENT_METHOD: &str = "paypal";

/// Order-number collisions are possible (timestamp + 3 random digits); on a
/// duplicate the insert is retried with a fresh number.
const ORDER_NUMBER_ATTEMPTS: u32 = 3;

#[derive(Debug)]
pub struct CreateOrder {
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub payment_method: Option<String>,
    pub activation_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct FulfillmentService {
    pool: PgPool,
    orders: OrderRepository,
    esims: EsimRepository,
    plans: PlanRepository,
    users: UserRepository,
    email: Option<EmailService>,
}

impl FulfillmentService {
    pub fn new(
        pool: PgPool,
        orders: OrderRepository,
        esims: EsimRepository,
        plans: PlanRepository,
        users: UserRepository,
        email: Option<EmailService>,
    ) -> Self {
        Self {
            pool,
            orders,
            esims,
            plans,
            users,
            email,
        }
    }

    /// Create a pending order for a plan.
    ///
    /// Availability is checked here only as an advisory pre-check so a
    /// customer is not sold a plan with an empty pool; the binding
    /// guarantee is the atomic claim at payment completion.
    #[tracing::instrument(skip(self, req), fields(customer_id = %req.customer_id, plan_id = %req.plan_id))]
    pub async fn create_order(&self, req: CreateOrder) -> Result<Order, AppError> {
        let customer = self
            .users
            .find_by_id(req.customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;
        if !customer.is_active {
            return Err(AppError::BadRequest(
                "Customer account is inactive".to_string(),
            ));
        }

        let plan = self
            .plans
            .get(req.plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))?;
        if !plan.is_active {
            return Err(AppError::BadRequest(
                "Plan is no longer available".to_string(),
            ));
        }

        if self.esims.find_available(plan.id).await?.is_none() {
            return Err(AppError::Conflict(
                "No available eSIMs for this plan".to_string(),
            ));
        }

        let activation_date = req.activation_date.unwrap_or_else(Utc::now);
        let expiry_date = activation_date + Duration::days(i64::from(plan.validity_days));
        let payment_method = req
            .payment_method
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());

        let mut attempt = 0;
        let order = loop {
            attempt += 1;
            let result = self
                .orders
                .create(NewOrder {
                    customer_id: customer.id,
                    plan_id: plan.id,
                    order_number: generate_order_number(),
                    amount: plan.price,
                    currency: DEFAULT_CURRENCY.to_string(),
                    payment_method: payment_method.clone(),
                    activation_date,
                    expiry_date,
                })
                .await;
            match result {
                Ok(order) => break order,
                Err(AppError::Conflict(_)) if attempt < ORDER_NUMBER_ATTEMPTS => continue,
                Err(err) => return Err(err),
            }
        };

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            "Order created"
        );

        if let Some(email) = &self.email {
            if let Err(err) = email.send_order_received(&customer.email, &order).await {
                tracing::warn!(order_id = %order.id, error = %err, "Failed to send order confirmation email");
            }
        }

        Ok(order)
    }

    /// Apply a payment status transition to an order.
    ///
    /// Validation happens up front; the inventory effect and the payment
    /// write then run in one transaction:
    /// - `completed` claims an esim for the order's plan and binds it
    ///   (purchase status `code_sent`); an empty pool aborts the whole
    ///   update, leaving the payment status untouched;
    /// - `refunded` releases the bound esim and expires the purchase;
    /// - `failed` releases the bound esim and resets the purchase to
    ///   pending. Release with no bound esim is a no-op.
    #[tracing::instrument(skip(self), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn apply_payment_status(
        &self,
        order_id: Uuid,
        new_status: PaymentStatus,
        transaction_id: Option<&str>,
        payment_reference: Option<&str>,
    ) -> Result<Order, AppError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order with ID {} not found", order_id)))?;

        if !order.payment_status.can_transition_to(new_status) {
            return Err(AppError::InvalidTransition {
                from: order.payment_status,
                to: new_status,
                allowed: order.payment_status.allowed_transitions(),
            });
        }

        if new_status == PaymentStatus::Completed
            && transaction_id.map_or(true, |t| t.trim().is_empty())
        {
            return Err(AppError::MissingTransactionId);
        }

        let mut tx = self.pool.begin().await?;

        let mut assigned_esim: Option<Esim> = None;
        match new_status {
            PaymentStatus::Completed => {
                if order.esim_id.is_none() {
                    let esim = self
                        .esims
                        .claim_available_tx(&mut tx, order.plan_id)
                        .await?
                        .ok_or(AppError::NoInventory {
                            plan_id: order.plan_id,
                        })?;
                    self.orders.bind_esim_tx(&mut tx, order.id, esim.id).await?;
                    assigned_esim = Some(esim);
                }
            }
            PaymentStatus::Refunded => {
                self.release_tx(&mut tx, &order, PurchaseStatus::Expired)
                    .await?;
            }
            PaymentStatus::Failed => {
                self.release_tx(&mut tx, &order, PurchaseStatus::Pending)
                    .await?;
            }
            // Unreachable: no state transitions back to pending.
            PaymentStatus::Pending => {}
        }

        // Guarded on the status the transition was validated against. A
        // concurrent transition on the same order (say a duplicate webhook
        // delivery) misses the guard; aborting here rolls back any claim
        // made above, so the other request's binding stays intact.
        let updated = self
            .orders
            .update_payment_fields_tx(
                &mut tx,
                order.id,
                order.payment_status,
                new_status,
                transaction_id,
                payment_reference,
            )
            .await?
            .ok_or_else(|| {
                AppError::Conflict(
                    "Order was updated concurrently; payment status not applied".to_string(),
                )
            })?;

        tx.commit().await?;

        tracing::info!(
            order_id = %updated.id,
            from = %order.payment_status,
            to = %new_status,
            esim_assigned = assigned_esim.is_some(),
            "Payment status applied"
        );

        if let Some(esim) = assigned_esim {
            self.send_qr_code(&updated, &esim).await;
        }

        Ok(updated)
    }

    /// Unbind the order's esim (if any) and return it to the pool.
    /// Idempotent: an order with no bound esim is left untouched.
    async fn release_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order: &Order,
        purchase_status: PurchaseStatus,
    ) -> Result<(), AppError> {
        let Some(esim_id) = order.esim_id else {
            return Ok(());
        };
        self.esims.mark_available_tx(tx, esim_id).await?;
        self.orders
            .release_esim_tx(tx, order.id, purchase_status)
            .await?;
        tracing::info!(order_id = %order.id, esim_id = %esim_id, "Released eSIM back to pool");
        Ok(())
    }

    /// Delete an order. The esim release and the row removal share one
    /// transaction so inventory is never stranded in `assigned` by an order
    /// that no longer exists, and never released without the order going.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), AppError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order with ID {} not found", order_id)))?;

        let mut tx = self.pool.begin().await?;
        if let Some(esim_id) = order.esim_id {
            self.esims.mark_available_tx(&mut tx, esim_id).await?;
        }
        self.orders.delete_tx(&mut tx, order.id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Order plus its bound esim for detail responses.
    pub async fn order_details(&self, order: Order) -> Result<OrderDetails, AppError> {
        let esim = match order.esim_id {
            Some(esim_id) => self.esims.get(esim_id).await?,
            None => None,
        };
        Ok(OrderDetails { order, esim })
    }

    /// Best-effort QR-code email after a successful allocation. Runs after
    /// commit; a delivery failure never unwinds the fulfillment.
    async fn send_qr_code(&self, order: &Order, esim: &Esim) {
        let Some(email) = &self.email else {
            return;
        };
        let customer = match self.users.find_by_id(order.customer_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(order_id = %order.id, error = %err, "Failed to load customer for QR email");
                return;
            }
        };
        if let Err(err) = email.send_esim_qr_code(&customer.email, order, esim).await {
            tracing::warn!(order_id = %order.id, error = %err, "Failed to send eSIM QR code email");
        }
    }
}
