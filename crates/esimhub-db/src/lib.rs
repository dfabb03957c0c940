//! Database repositories for the data access layer
//!
//! One repository per entity, each a `Clone` struct over a `PgPool`.
//! Mutations that participate in the fulfillment transaction expose `_tx`
//! variants taking `&mut Transaction<'_, Postgres>` so the caller controls
//! atomicity. Store-level constraint violations are translated into domain
//! errors here; raw sqlx errors never cross this boundary for unique/FK
//! conflicts.

pub mod db;

pub use db::audit::AdminActionRepository;
pub use db::esim::EsimRepository;
pub use db::favorite::FavoriteRepository;
pub use db::order::{NewOrder, OrderPatch, OrderRepository};
pub use db::password_reset::PasswordResetRepository;
pub use db::plan::{NewPlan, PlanPatch, PlanRepository};
pub use db::provider::{ProviderPatch, ProviderRepository};
pub use db::user::UserRepository;
