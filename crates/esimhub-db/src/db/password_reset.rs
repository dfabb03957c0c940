use esimhub_core::models::PasswordReset;
use esimhub_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Password-reset token store. Tokens arrive here already hashed; rows for
/// a user are replaced on each request and deleted once consumed.
#[derive(Clone)]
pub struct PasswordResetRepository {
    pool: PgPool,
}

impl PasswordResetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a new reset token for the user, invalidating any earlier one.
    #[tracing::instrument(skip(self, token_hash), fields(db.table = "password_resets", db.operation = "insert"))]
    pub async fn create(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_in_minutes: i64,
    ) -> Result<PasswordReset, AppError> {
        sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        let reset = sqlx::query_as::<Postgres, PasswordReset>(
            r#"
            INSERT INTO password_resets (user_id, token_hash, expires_at)
            VALUES ($1, $2, NOW() + make_interval(mins => $3))
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_in_minutes)
        .fetch_one(&self.pool)
        .await?;
        Ok(reset)
    }

    /// Look up an unexpired reset by token hash.
    #[tracing::instrument(skip(self, token_hash), fields(db.table = "password_resets", db.operation = "select"))]
    pub async fn find_valid(&self, token_hash: &str) -> Result<Option<PasswordReset>, AppError> {
        let reset = sqlx::query_as::<Postgres, PasswordReset>(
            "SELECT * FROM password_resets WHERE token_hash = $1 AND expires_at > NOW()",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reset)
    }

    /// Remove every reset for the user; called after a successful reset so
    /// the token is single-use.
    #[tracing::instrument(skip(self), fields(db.table = "password_resets", db.operation = "delete"))]
    pub async fn delete_for_user(&self, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
