//! Data models for the application
//!
//! One sub-module per domain entity. Status enums map to the matching
//! Postgres enum types via `sqlx::Type`.

mod audit;
mod esim;
mod favorite;
mod order;
mod password_reset;
mod plan;
mod provider;
mod user;

pub use audit::*;
pub use esim::*;
pub use favorite::*;
pub use order::*;
pub use password_reset::*;
pub use plan::*;
pub use provider::*;
pub use user::*;
