//! Password-reset flow: token issuance and consumption.
//!
//! The raw token only ever leaves the service inside the reset email; the
//! store holds its SHA-256 hash. Requests for unknown or inactive accounts
//! succeed silently so the endpoint does not reveal which emails exist.

use esimhub_core::AppError;
use esimhub_db::{PasswordResetRepository, UserRepository};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::password;
use crate::services::email::EmailService;

const RESET_TOKEN_TTL_MINUTES: i64 = 60;

fn generate_reset_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[derive(Clone)]
pub struct PasswordResetService {
    users: UserRepository,
    resets: PasswordResetRepository,
    email: Option<EmailService>,
}

impl PasswordResetService {
    pub fn new(
        users: UserRepository,
        resets: PasswordResetRepository,
        email: Option<EmailService>,
    ) -> Self {
        Self {
            users,
            resets,
            email,
        }
    }

    /// Issue a reset token for the account behind `email_addr`, replacing
    /// any earlier one. Succeeds without effect when the account does not
    /// exist or is deactivated.
    #[tracing::instrument(skip(self, email_addr))]
    pub async fn request_reset(&self, email_addr: &str) -> Result<(), AppError> {
        let Some(user) = self.users.find_by_email(email_addr).await? else {
            return Ok(());
        };
        if !user.is_active {
            return Ok(());
        }

        let token = generate_reset_token();
        self.resets
            .create(user.id, &hash_reset_token(&token), RESET_TOKEN_TTL_MINUTES)
            .await?;
        tracing::info!(user_id = %user.id, "Password reset token issued");

        if let Some(email) = &self.email {
            if let Err(err) = email.send_password_reset(&user.email, &token).await {
                tracing::warn!(user_id = %user.id, error = %err, "Failed to send password reset email");
            }
        }
        Ok(())
    }

    /// Consume a reset token and set the new password. The token is
    /// single-use: every outstanding reset for the user is removed.
    #[tracing::instrument(skip(self, token, new_password))]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let reset = self
            .resets
            .find_valid(&hash_reset_token(token))
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("Invalid or expired reset token".to_string())
            })?;

        let hash = password::hash(new_password)?;
        self.users.update_password(reset.user_id, &hash).await?;
        self.resets.delete_for_user(reset.user_id).await?;
        tracing::info!(user_id = %reset.user_id, "Password reset completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_tokens_are_long_and_unique() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn token_hash_is_deterministic_hex_sha256() {
        let token = "abc";
        assert_eq!(hash_reset_token(token), hash_reset_token(token));
        assert_eq!(hash_reset_token(token).len(), 64);
        assert_ne!(hash_reset_token(token), token);
    }
}
