use esimhub_core::models::{ActionCategory, ActionType, AdminAction};
use esimhub_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Append-only admin audit trail.
#[derive(Clone)]
pub struct AdminActionRepository {
    pool: PgPool,
}

impl AdminActionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "admin_actions", db.operation = "insert"))]
    pub async fn record(
        &self,
        admin_id: Uuid,
        category: ActionCategory,
        action: ActionType,
        entity_id: Uuid,
        notes: Option<&str>,
    ) -> Result<AdminAction, AppError> {
        let row = sqlx::query_as::<Postgres, AdminAction>(
            r#"
            INSERT INTO admin_actions (admin_id, category, action, entity_id, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(admin_id)
        .bind(category)
        .bind(action)
        .bind(entity_id)
        .bind(notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "admin_actions", db.operation = "select"))]
    pub async fn list(
        &self,
        category: Option<ActionCategory>,
        admin_id: Option<Uuid>,
    ) -> Result<Vec<AdminAction>, AppError> {
        let rows = sqlx::query_as::<Postgres, AdminAction>(
            r#"
            SELECT * FROM admin_actions
            WHERE ($1::action_category IS NULL OR category = $1)
              AND ($2::UUID IS NULL OR admin_id = $2)
            ORDER BY performed_at DESC
            "#,
        )
        .bind(category)
        .bind(admin_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "admin_actions", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<AdminAction>, AppError> {
        let row = sqlx::query_as::<Postgres, AdminAction>(
            "SELECT * FROM admin_actions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
