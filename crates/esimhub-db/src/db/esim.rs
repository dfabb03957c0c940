use esimhub_core::models::{Esim, EsimStatus};
use esimhub_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::conflict_on_unique;

/// eSIM inventory repository.
///
/// Inventory rows are the one shared resource requiring exclusive-mutation
/// discipline: every status move between `available` and `assigned` goes
/// through the conditional updates here, inside the caller's transaction.
#[derive(Clone)]
pub struct EsimRepository {
    pool: PgPool,
}

impl EsimRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "esims", db.operation = "select"))]
    pub async fn list(&self, status: Option<EsimStatus>) -> Result<Vec<Esim>, AppError> {
        let esims = match status {
            None => {
                sqlx::query_as::<Postgres, Esim>("SELECT * FROM esims ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
            Some(status) => {
                sqlx::query_as::<Postgres, Esim>(
                    "SELECT * FROM esims WHERE status = $1 ORDER BY created_at DESC",
                )
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(esims)
    }

    #[tracing::instrument(skip(self), fields(db.table = "esims", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Esim>, AppError> {
        let esim = sqlx::query_as::<Postgres, Esim>("SELECT * FROM esims WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(esim)
    }

    /// Any one available esim for the plan. Advisory only: order creation
    /// uses this as a pre-check, allocation uses `claim_available_tx`.
    #[tracing::instrument(skip(self), fields(db.table = "esims", db.operation = "select"))]
    pub async fn find_available(&self, plan_id: Uuid) -> Result<Option<Esim>, AppError> {
        let esim = sqlx::query_as::<Postgres, Esim>(
            "SELECT * FROM esims WHERE plan_id = $1 AND status = 'available' LIMIT 1",
        )
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(esim)
    }

    /// Atomically claim one available esim for the plan: select-and-mark in
    /// a single statement so two orders racing for the last esim cannot
    /// both succeed. `FOR UPDATE SKIP LOCKED` makes concurrent claimers
    /// pick distinct rows instead of serializing on the same one.
    ///
    /// Returns `None` when the plan has no available inventory; the caller
    /// decides whether that aborts its transaction.
    pub async fn claim_available_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        plan_id: Uuid,
    ) -> Result<Option<Esim>, AppError> {
        let esim = sqlx::query_as::<Postgres, Esim>(
            r#"
            UPDATE esims
            SET status = 'assigned', updated_at = NOW()
            WHERE id = (
                SELECT id FROM esims
                WHERE plan_id = $1 AND status = 'available'
                ORDER BY created_at
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .bind(plan_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(esim)
    }

    /// Return a claimed esim to the available pool.
    pub async fn mark_available_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE esims SET status = 'available', updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, qr_code), fields(db.table = "esims", db.operation = "insert"))]
    pub async fn create(
        &self,
        plan_id: Uuid,
        phone_number: &str,
        iccid: &str,
        qr_code: &str,
    ) -> Result<Esim, AppError> {
        let esim = sqlx::query_as::<Postgres, Esim>(
            r#"
            INSERT INTO esims (plan_id, phone_number, iccid, qr_code, status)
            VALUES ($1, $2, $3, $4, 'available')
            RETURNING *
            "#,
        )
        .bind(plan_id)
        .bind(phone_number)
        .bind(iccid)
        .bind(qr_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "An eSIM with this phone number or ICCID already exists"))?;
        Ok(esim)
    }

    /// Update provisioning fields. Status changes are not accepted here;
    /// they belong to the allocation path.
    #[tracing::instrument(skip(self, qr_code), fields(db.table = "esims", db.operation = "update", db.record_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        iccid: Option<&str>,
        qr_code: Option<&str>,
    ) -> Result<Esim, AppError> {
        let esim = sqlx::query_as::<Postgres, Esim>(
            r#"
            UPDATE esims
            SET iccid = COALESCE($2, iccid),
                qr_code = COALESCE($3, qr_code),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(iccid)
        .bind(qr_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "An eSIM with this ICCID already exists"))?
        .ok_or_else(|| AppError::NotFound(format!("eSIM with ID {} not found", id)))?;
        Ok(esim)
    }

    #[tracing::instrument(skip(self), fields(db.table = "esims", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let rows = sqlx::query("DELETE FROM esims WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }
}
