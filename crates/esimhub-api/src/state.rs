//! Application state shared across handlers.

use esimhub_core::Config;
use esimhub_db::{
    AdminActionRepository, EsimRepository, FavoriteRepository, OrderRepository,
    PasswordResetRepository, PlanRepository, ProviderRepository, UserRepository,
};
use sqlx::PgPool;

use crate::services::audit::AuditService;
use crate::services::email::EmailService;
use crate::services::fulfillment::FulfillmentService;
use crate::services::password_reset::PasswordResetService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub users: UserRepository,
    pub providers: ProviderRepository,
    pub plans: PlanRepository,
    pub esims: EsimRepository,
    pub orders: OrderRepository,
    pub favorites: FavoriteRepository,
    pub audit: AuditService,
    pub fulfillment: FulfillmentService,
    pub password_reset: PasswordResetService,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Self {
        let users = UserRepository::new(pool.clone());
        let providers = ProviderRepository::new(pool.clone());
        let plans = PlanRepository::new(pool.clone());
        let esims = EsimRepository::new(pool.clone());
        let orders = OrderRepository::new(pool.clone());
        let favorites = FavoriteRepository::new(pool.clone());
        let audit = AuditService::new(AdminActionRepository::new(pool.clone()));
        let email = EmailService::from_config(&config);
        let fulfillment = FulfillmentService::new(
            pool.clone(),
            orders.clone(),
            esims.clone(),
            plans.clone(),
            users.clone(),
            email.clone(),
        );
        let password_reset = PasswordResetService::new(
            users.clone(),
            PasswordResetRepository::new(pool.clone()),
            email,
        );

        Self {
            config,
            pool,
            users,
            providers,
            plans,
            esims,
            orders,
            favorites,
            audit,
            fulfillment,
            password_reset,
        }
    }
}
