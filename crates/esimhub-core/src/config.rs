//! Configuration module
//!
//! Application configuration loaded from environment variables (with `.env`
//! support via dotenvy). Database, server, auth, and SMTP settings live here.

use std::env;

use anyhow::{Context, Result};

const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub environment: String,
    // SMTP / email notifications
    pub email_enabled: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from the environment. `DATABASE_URL` and
    /// `JWT_SECRET` are required; everything else has defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters");
        }

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            server_port: env_or("SERVER_PORT", DEFAULT_SERVER_PORT),
            cors_origins,
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            db_timeout_seconds: env_or("DB_TIMEOUT_SECONDS", DEFAULT_CONNECTION_TIMEOUT_SECS),
            jwt_secret,
            jwt_expiry_hours: env_or("JWT_EXPIRY_HOURS", DEFAULT_JWT_EXPIRY_HOURS),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            email_enabled: env_bool("EMAIL_ENABLED", false),
            smtp_host: env::var("SMTP_HOST").ok(),
            smtp_port: env::var("SMTP_PORT").ok().and_then(|v| v.parse().ok()),
            smtp_user: env::var("SMTP_USER").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM").ok(),
            smtp_tls: env_bool("SMTP_TLS", true),
        })
    }

    /// Check if the application is running in production mode.
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_bool_parses_truthy_values() {
        std::env::set_var("TEST_ENV_BOOL_A", "true");
        std::env::set_var("TEST_ENV_BOOL_B", "1");
        std::env::set_var("TEST_ENV_BOOL_C", "false");
        assert!(env_bool("TEST_ENV_BOOL_A", false));
        assert!(env_bool("TEST_ENV_BOOL_B", false));
        assert!(!env_bool("TEST_ENV_BOOL_C", true));
        assert!(env_bool("TEST_ENV_BOOL_MISSING", true));
    }

    #[test]
    fn env_or_falls_back_on_unparseable() {
        std::env::set_var("TEST_ENV_OR_PORT", "not-a-number");
        let port: u16 = env_or("TEST_ENV_OR_PORT", 3000);
        assert_eq!(port, 3000);
    }
}
