pub mod audit;
pub mod esim;
pub mod favorite;
pub mod order;
pub mod password_reset;
pub mod plan;
pub mod provider;
pub mod user;

use esimhub_core::AppError;

/// Translate a unique-constraint violation into `Conflict`; everything else
/// stays a database error.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

/// Translate a foreign-key violation into `NotFound`; everything else stays
/// a database error.
pub(crate) fn not_found_on_fk(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::NotFound(message.to_string())
        }
        _ => AppError::Database(err),
    }
}
