use chrono::{DateTime, Utc};
use esimhub_core::models::{Order, PaymentStatus, PurchaseStatus};
use esimhub_core::AppError;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::conflict_on_unique;

/// Fields for a new order. Amount is the plan price at creation time.
#[derive(Debug)]
pub struct NewOrder {
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub order_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: String,
    pub activation_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
}

/// Optional fields for an admin order patch; `None` leaves a column as-is.
#[derive(Debug, Default)]
pub struct OrderPatch {
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub purchase_status: Option<PurchaseStatus>,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub transaction_id: Option<String>,
    pub activation_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Purchase record repository.
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, order), fields(db.table = "orders", db.operation = "insert"))]
    pub async fn create(&self, order: NewOrder) -> Result<Order, AppError> {
        let created = sqlx::query_as::<Postgres, Order>(
            r#"
            INSERT INTO orders (
                customer_id, plan_id, order_number, amount, currency,
                payment_method, activation_date, expiry_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(order.customer_id)
        .bind(order.plan_id)
        .bind(&order.order_number)
        .bind(order.amount)
        .bind(&order.currency)
        .bind(&order.payment_method)
        .bind(order.activation_date)
        .bind(order.expiry_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Order number already exists"))?;
        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "orders", db.operation = "select", db.record_id = %id))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        let order = sqlx::query_as::<Postgres, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    #[tracing::instrument(skip(self), fields(db.table = "orders", db.operation = "select"))]
    pub async fn find_by_order_number(&self, order_number: &str) -> Result<Option<Order>, AppError> {
        let order =
            sqlx::query_as::<Postgres, Order>("SELECT * FROM orders WHERE order_number = $1")
                .bind(order_number)
                .fetch_optional(&self.pool)
                .await?;
        Ok(order)
    }

    /// Order currently holding the given esim, if any. Used by esim
    /// deletion to refuse removing linked inventory.
    #[tracing::instrument(skip(self), fields(db.table = "orders", db.operation = "select"))]
    pub async fn find_by_esim(&self, esim_id: Uuid) -> Result<Option<Order>, AppError> {
        let order = sqlx::query_as::<Postgres, Order>("SELECT * FROM orders WHERE esim_id = $1")
            .bind(esim_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    #[tracing::instrument(skip(self), fields(db.table = "orders", db.operation = "select"))]
    pub async fn list_all(&self) -> Result<Vec<Order>, AppError> {
        let orders =
            sqlx::query_as::<Postgres, Order>("SELECT * FROM orders ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(orders)
    }

    #[tracing::instrument(skip(self), fields(db.table = "orders", db.operation = "select"))]
    pub async fn list_by_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, AppError> {
        let orders = sqlx::query_as::<Postgres, Order>(
            "SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    /// Bind a freshly claimed esim to the order and mark the code sent.
    /// Runs inside the allocation transaction.
    pub async fn bind_esim_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        esim_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE orders
            SET esim_id = $2, purchase_status = 'code_sent', sent_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(esim_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Unbind the esim and set the purchase status per the release reason
    /// (refunded -> expired, failed -> pending).
    pub async fn release_esim_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        purchase_status: PurchaseStatus,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE orders
            SET esim_id = NULL, purchase_status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(purchase_status)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Persist the payment transition in the same transaction as the
    /// allocation/release it triggered. Compare-and-swap on the status the
    /// caller validated against: a concurrent transition on the same order
    /// makes the guard miss and the update returns `None`, so the caller
    /// aborts instead of overwriting the newer state.
    pub async fn update_payment_fields_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        from: PaymentStatus,
        status: PaymentStatus,
        transaction_id: Option<&str>,
        payment_reference: Option<&str>,
    ) -> Result<Option<Order>, AppError> {
        let order = sqlx::query_as::<Postgres, Order>(
            r#"
            UPDATE orders
            SET payment_status = $3,
                transaction_id = COALESCE($4, transaction_id),
                payment_reference = COALESCE($5, payment_reference),
                updated_at = NOW()
            WHERE id = $1 AND payment_status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(status)
        .bind(transaction_id)
        .bind(payment_reference)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Transaction ID or payment reference already used"))?;
        Ok(order)
    }

    #[tracing::instrument(skip(self, patch), fields(db.table = "orders", db.operation = "update", db.record_id = %id))]
    pub async fn update_fields(&self, id: Uuid, patch: OrderPatch) -> Result<Order, AppError> {
        let order = sqlx::query_as::<Postgres, Order>(
            r#"
            UPDATE orders
            SET amount = COALESCE($2, amount),
                currency = COALESCE($3, currency),
                purchase_status = COALESCE($4, purchase_status),
                payment_method = COALESCE($5, payment_method),
                payment_reference = COALESCE($6, payment_reference),
                transaction_id = COALESCE($7, transaction_id),
                activation_date = COALESCE($8, activation_date),
                expiry_date = COALESCE($9, expiry_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.amount)
        .bind(patch.currency)
        .bind(patch.purchase_status)
        .bind(patch.payment_method)
        .bind(patch.payment_reference)
        .bind(patch.transaction_id)
        .bind(patch.activation_date)
        .bind(patch.expiry_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Transaction ID or payment reference already used"))?
        .ok_or_else(|| AppError::NotFound(format!("Order with ID {} not found", id)))?;
        Ok(order)
    }

    /// Runs inside the deletion transaction so the esim release and the row
    /// removal land together.
    pub async fn delete_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<bool, AppError> {
        let rows = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }
}
