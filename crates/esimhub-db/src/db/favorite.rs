use esimhub_core::models::FavoritePlan;
use esimhub_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::{conflict_on_unique, not_found_on_fk};

#[derive(Clone)]
pub struct FavoriteRepository {
    pool: PgPool,
}

impl FavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "favorite_plans", db.operation = "insert"))]
    pub async fn add(&self, customer_id: Uuid, plan_id: Uuid) -> Result<FavoritePlan, AppError> {
        let fav = sqlx::query_as::<Postgres, FavoritePlan>(
            r#"
            INSERT INTO favorite_plans (customer_id, plan_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(plan_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
                conflict_on_unique(e, "Plan is already in favorites")
            } else {
                not_found_on_fk(e, "Plan not found")
            }
        })?;
        Ok(fav)
    }

    #[tracing::instrument(skip(self), fields(db.table = "favorite_plans", db.operation = "delete"))]
    pub async fn remove(&self, customer_id: Uuid, plan_id: Uuid) -> Result<bool, AppError> {
        let rows = sqlx::query(
            "DELETE FROM favorite_plans WHERE customer_id = $1 AND plan_id = $2",
        )
        .bind(customer_id)
        .bind(plan_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "favorite_plans", db.operation = "select"))]
    pub async fn list(&self, customer_id: Uuid) -> Result<Vec<FavoritePlan>, AppError> {
        let favs = sqlx::query_as::<Postgres, FavoritePlan>(
            "SELECT * FROM favorite_plans WHERE customer_id = $1 ORDER BY added_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(favs)
    }
}
