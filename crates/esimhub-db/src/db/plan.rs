use esimhub_core::models::Plan;
use esimhub_core::AppError;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::not_found_on_fk;

#[derive(Debug)]
pub struct NewPlan {
    pub provider_id: Uuid,
    pub name: String,
    pub data_amount_gb: i32,
    pub call_minutes: i32,
    pub sms_count: i32,
    pub validity_days: i32,
    pub price: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Default)]
pub struct PlanPatch {
    pub name: Option<String>,
    pub data_amount_gb: Option<i32>,
    pub call_minutes: Option<i32>,
    pub sms_count: Option<i32>,
    pub validity_days: Option<i32>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Data plan catalog repository.
#[derive(Clone)]
pub struct PlanRepository {
    pool: PgPool,
}

impl PlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "plans", db.operation = "select"))]
    pub async fn list(&self, active_only: bool) -> Result<Vec<Plan>, AppError> {
        let plans = sqlx::query_as::<Postgres, Plan>(
            "SELECT * FROM plans WHERE (NOT $1 OR is_active) ORDER BY name",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(plans)
    }

    #[tracing::instrument(skip(self), fields(db.table = "plans", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Plan>, AppError> {
        let plan = sqlx::query_as::<Postgres, Plan>("SELECT * FROM plans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(plan)
    }

    #[tracing::instrument(skip(self, plan), fields(db.table = "plans", db.operation = "insert"))]
    pub async fn create(&self, plan: NewPlan) -> Result<Plan, AppError> {
        let created = sqlx::query_as::<Postgres, Plan>(
            r#"
            INSERT INTO plans (
                provider_id, name, data_amount_gb, call_minutes, sms_count,
                validity_days, price, description
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(plan.provider_id)
        .bind(&plan.name)
        .bind(plan.data_amount_gb)
        .bind(plan.call_minutes)
        .bind(plan.sms_count)
        .bind(plan.validity_days)
        .bind(plan.price)
        .bind(&plan.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_on_fk(e, "Provider not found"))?;
        Ok(created)
    }

    #[tracing::instrument(skip(self, patch), fields(db.table = "plans", db.operation = "update", db.record_id = %id))]
    pub async fn update(&self, id: Uuid, patch: PlanPatch) -> Result<Plan, AppError> {
        let plan = sqlx::query_as::<Postgres, Plan>(
            r#"
            UPDATE plans
            SET name = COALESCE($2, name),
                data_amount_gb = COALESCE($3, data_amount_gb),
                call_minutes = COALESCE($4, call_minutes),
                sms_count = COALESCE($5, sms_count),
                validity_days = COALESCE($6, validity_days),
                price = COALESCE($7, price),
                description = COALESCE($8, description),
                is_active = COALESCE($9, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.data_amount_gb)
        .bind(patch.call_minutes)
        .bind(patch.sms_count)
        .bind(patch.validity_days)
        .bind(patch.price)
        .bind(patch.description)
        .bind(patch.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plan with ID {} not found", id)))?;
        Ok(plan)
    }

    /// Deletion is refused by the database while orders reference the plan
    /// (esims cascade).
    #[tracing::instrument(skip(self), fields(db.table = "plans", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let rows = sqlx::query("DELETE FROM plans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    AppError::Conflict("Plan has orders and cannot be deleted".to_string())
                }
                other => AppError::Database(other),
            })?
            .rows_affected();
        Ok(rows > 0)
    }
}
