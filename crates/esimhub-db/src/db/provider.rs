use esimhub_core::models::Provider;
use esimhub_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::conflict_on_unique;

#[derive(Debug, Default)]
pub struct ProviderPatch {
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// eSIM provider (carrier) registry.
#[derive(Clone)]
pub struct ProviderRepository {
    pool: PgPool,
}

impl ProviderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "providers", db.operation = "select"))]
    pub async fn list(&self) -> Result<Vec<Provider>, AppError> {
        let providers =
            sqlx::query_as::<Postgres, Provider>("SELECT * FROM providers ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(providers)
    }

    #[tracing::instrument(skip(self), fields(db.table = "providers", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Provider>, AppError> {
        let provider = sqlx::query_as::<Postgres, Provider>("SELECT * FROM providers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(provider)
    }

    #[tracing::instrument(skip(self), fields(db.table = "providers", db.operation = "insert"))]
    pub async fn create(
        &self,
        name: &str,
        logo_url: Option<&str>,
        description: Option<&str>,
    ) -> Result<Provider, AppError> {
        let provider = sqlx::query_as::<Postgres, Provider>(
            r#"
            INSERT INTO providers (name, logo_url, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(logo_url)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Provider name already exists"))?;
        Ok(provider)
    }

    #[tracing::instrument(skip(self, patch), fields(db.table = "providers", db.operation = "update", db.record_id = %id))]
    pub async fn update(&self, id: Uuid, patch: ProviderPatch) -> Result<Provider, AppError> {
        let provider = sqlx::query_as::<Postgres, Provider>(
            r#"
            UPDATE providers
            SET name = COALESCE($2, name),
                logo_url = COALESCE($3, logo_url),
                description = COALESCE($4, description),
                is_active = COALESCE($5, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.logo_url)
        .bind(patch.description)
        .bind(patch.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Provider name already exists"))?
        .ok_or_else(|| AppError::NotFound(format!("Provider with ID {} not found", id)))?;
        Ok(provider)
    }

    /// Plans cascade with the provider, but the delete is refused while any
    /// of those plans still has orders (orders restrict plan deletion).
    #[tracing::instrument(skip(self), fields(db.table = "providers", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let rows = sqlx::query("DELETE FROM providers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    AppError::Conflict(
                        "Provider has plans with orders and cannot be deleted".to_string(),
                    )
                }
                other => AppError::Database(other),
            })?
            .rows_affected();
        Ok(rows > 0)
    }
}
