//! Seed data for integration tests: users, catalog entries, inventory.

use esimhub_api::auth::{password, token};
use esimhub_core::models::{Esim, Order, Plan, Provider, Role, User};
use esimhub_db::NewPlan;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::TestApp;

pub const TEST_PASSWORD: &str = "password123";

/// A seeded user together with a valid bearer token.
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

async fn seed_user(app: &TestApp, email: &str, role: Role) -> TestUser {
    let hash = password::hash(TEST_PASSWORD).expect("hash password");
    let user = app
        .state
        .users
        .create(email, &hash, "Test User", None, role)
        .await
        .expect("create user");
    let token = token::issue(&app.state.config, &user).expect("issue token");
    TestUser { user, token }
}

pub async fn seed_admin(app: &TestApp) -> TestUser {
    seed_user(app, &format!("admin-{}@example.com", Uuid::new_v4()), Role::Admin).await
}

pub async fn seed_customer(app: &TestApp) -> TestUser {
    seed_user(
        app,
        &format!("customer-{}@example.com", Uuid::new_v4()),
        Role::Customer,
    )
    .await
}

/// Provider plus a 30-day plan priced 19.99 EUR.
pub async fn seed_catalog(app: &TestApp) -> (Provider, Plan) {
    let provider = app
        .state
        .providers
        .create(&format!("Provider {}", Uuid::new_v4()), None, None)
        .await
        .expect("create provider");
    let plan = app
        .state
        .plans
        .create(NewPlan {
            provider_id: provider.id,
            name: "Europe 10GB".to_string(),
            data_amount_gb: 10,
            call_minutes: 100,
            sms_count: 100,
            validity_days: 30,
            price: Decimal::new(1999, 2),
            description: None,
        })
        .await
        .expect("create plan");
    (provider, plan)
}

/// Provision `count` available esims for the plan.
pub async fn seed_esims(app: &TestApp, plan_id: Uuid, count: usize) -> Vec<Esim> {
    let mut esims = Vec::with_capacity(count);
    for _ in 0..count {
        let suffix = Uuid::new_v4().simple().to_string();
        let esim = app
            .state
            .esims
            .create(
                plan_id,
                &format!("+3162{}", &suffix[..7]),
                &format!("89310{}", &suffix[..15]),
                &format!("LPA:1$rsp.example.com${}", suffix),
            )
            .await
            .expect("create esim");
        esims.push(esim);
    }
    esims
}

/// Place an order through the API as the given customer.
pub async fn place_order(app: &TestApp, customer: &TestUser, plan_id: Uuid) -> Order {
    let response = app
        .client()
        .post(&super::api_path("/orders"))
        .add_header("Authorization", customer.bearer())
        .json(&serde_json::json!({ "plan_id": plan_id }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    response.json::<Order>()
}
