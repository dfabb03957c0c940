//! Catalog, inventory guard, favorites, and audit-trail integration tests.
//!
//! Run with: `cargo test -p esimhub-api --test catalog_test`
//! Requires Docker for testcontainers (Postgres).

mod helpers;

use esimhub_core::models::{AdminAction, Esim, FavoritePlan, Plan, Provider};
use helpers::fixtures::{place_order, seed_admin, seed_catalog, seed_customer, seed_esims};
use helpers::{api_path, setup_test_app};

#[tokio::test]
async fn register_login_and_reject_bad_credentials() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/auth/register"))
        .json(&serde_json::json!({
            "email": "carol@example.com",
            "password": "password123",
            "full_name": "Carol"
        }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    let body = response.json::<serde_json::Value>();
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["role"], "customer");
    assert!(body["user"]["password_hash"].is_null());

    // Duplicate email.
    let response = app
        .client()
        .post(&api_path("/auth/register"))
        .json(&serde_json::json!({
            "email": "carol@example.com",
            "password": "password123",
            "full_name": "Carol Again"
        }))
        .await;
    assert_eq!(response.status_code(), 409);

    let response = app
        .client()
        .post(&api_path("/auth/login"))
        .json(&serde_json::json!({ "email": "carol@example.com", "password": "password123" }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = app
        .client()
        .post(&api_path("/auth/login"))
        .json(&serde_json::json!({ "email": "carol@example.com", "password": "wrong-password" }))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn authenticated_routes_require_a_token() {
    let app = setup_test_app().await;

    let response = app.client().get(&api_path("/plans")).await;
    assert_eq!(response.status_code(), 401);

    let response = app
        .client()
        .get(&api_path("/plans"))
        .add_header("Authorization", "Bearer not-a-real-token")
        .await;
    assert_eq!(response.status_code(), 401);

    // Health stays public.
    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn catalog_mutations_are_admin_only_and_audited() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let customer = seed_customer(&app).await;

    // Customers cannot create providers.
    let response = app
        .client()
        .post(&api_path("/providers"))
        .add_header("Authorization", customer.bearer())
        .json(&serde_json::json!({ "name": "Nope Mobile" }))
        .await;
    assert_eq!(response.status_code(), 403);

    let response = app
        .client()
        .post(&api_path("/providers"))
        .add_header("Authorization", admin.bearer())
        .json(&serde_json::json!({ "name": "Orange NL" }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    let provider = response.json::<Provider>();

    let response = app
        .client()
        .post(&api_path("/plans"))
        .add_header("Authorization", admin.bearer())
        .json(&serde_json::json!({
            "provider_id": provider.id,
            "name": "Benelux 5GB",
            "data_amount_gb": 5,
            "validity_days": 14,
            "price": "9.99"
        }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    let plan = response.json::<Plan>();

    let response = app
        .client()
        .post(&api_path("/esims"))
        .add_header("Authorization", admin.bearer())
        .json(&serde_json::json!({
            "plan_id": plan.id,
            "phone_number": "+31612345678",
            "iccid": "8931000000000000001",
            "qr_code": "LPA:1$rsp.example.com$ABC"
        }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());

    // Three audited mutations, newest first.
    let response = app
        .client()
        .get(&api_path("/admin/actions"))
        .add_header("Authorization", admin.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    let actions = response.json::<Vec<AdminAction>>();
    assert_eq!(actions.len(), 3);
    assert!(actions.iter().all(|a| a.admin_id == admin.id()));

    // The trail itself is admin-only.
    let response = app
        .client()
        .get(&api_path("/admin/actions"))
        .add_header("Authorization", customer.bearer())
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn plan_listing_filters_inactive() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;

    let response = app
        .client()
        .patch(&api_path(&format!("/plans/{}", plan.id)))
        .add_header("Authorization", admin.bearer())
        .json(&serde_json::json!({ "is_active": false }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = app
        .client()
        .get(&api_path("/plans?active=true"))
        .add_header("Authorization", customer.bearer())
        .await;
    assert_eq!(response.json::<Vec<Plan>>().len(), 0);

    let response = app
        .client()
        .get(&api_path("/plans"))
        .add_header("Authorization", customer.bearer())
        .await;
    assert_eq!(response.json::<Vec<Plan>>().len(), 1);
}

#[tokio::test]
async fn assigned_esims_cannot_be_modified_or_deleted() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;
    let esims = seed_esims(&app, plan.id, 1).await;

    let order = place_order(&app, &customer, plan.id).await;
    let response = app
        .client()
        .patch(&api_path(&format!("/orders/{}/payment", order.id)))
        .add_header("Authorization", admin.bearer())
        .json(&serde_json::json!({ "payment_status": "completed", "transaction_id": "TXN-G" }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = app
        .client()
        .patch(&api_path(&format!("/esims/{}", esims[0].id)))
        .add_header("Authorization", admin.bearer())
        .json(&serde_json::json!({ "qr_code": "LPA:1$other$XYZ" }))
        .await;
    assert_eq!(response.status_code(), 409);

    let response = app
        .client()
        .delete(&api_path(&format!("/esims/{}", esims[0].id)))
        .add_header("Authorization", admin.bearer())
        .await;
    assert_eq!(response.status_code(), 409);

    // After a refund the esim is released but still linked-free, so
    // deletion is allowed again.
    let response = app
        .client()
        .patch(&api_path(&format!("/orders/{}/payment", order.id)))
        .add_header("Authorization", admin.bearer())
        .json(&serde_json::json!({ "payment_status": "refunded" }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = app
        .client()
        .delete(&api_path(&format!("/esims/{}", esims[0].id)))
        .add_header("Authorization", admin.bearer())
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
}

#[tokio::test]
async fn esim_inventory_is_admin_only() {
    let app = setup_test_app().await;
    let customer = seed_customer(&app).await;

    let response = app
        .client()
        .get(&api_path("/esims"))
        .add_header("Authorization", customer.bearer())
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn esim_listing_filters_by_status() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;
    seed_esims(&app, plan.id, 2).await;

    let order = place_order(&app, &customer, plan.id).await;
    app.client()
        .patch(&api_path(&format!("/orders/{}/payment", order.id)))
        .add_header("Authorization", admin.bearer())
        .json(&serde_json::json!({ "payment_status": "completed", "transaction_id": "TXN-F" }))
        .await;

    let response = app
        .client()
        .get(&api_path("/esims?status=available"))
        .add_header("Authorization", admin.bearer())
        .await;
    assert_eq!(response.json::<Vec<Esim>>().len(), 1);

    let response = app
        .client()
        .get(&api_path("/esims?status=assigned"))
        .add_header("Authorization", admin.bearer())
        .await;
    assert_eq!(response.json::<Vec<Esim>>().len(), 1);
}

#[tokio::test]
async fn favorites_roundtrip_and_duplicate_conflict() {
    let app = setup_test_app().await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;

    let response = app
        .client()
        .post(&api_path(&format!("/favorites/{}", plan.id)))
        .add_header("Authorization", customer.bearer())
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    let favorite = response.json::<FavoritePlan>();
    assert_eq!(favorite.plan_id, plan.id);
    assert_eq!(favorite.customer_id, customer.id());

    let response = app
        .client()
        .post(&api_path(&format!("/favorites/{}", plan.id)))
        .add_header("Authorization", customer.bearer())
        .await;
    assert_eq!(response.status_code(), 409);

    let response = app
        .client()
        .get(&api_path("/favorites"))
        .add_header("Authorization", customer.bearer())
        .await;
    assert_eq!(response.json::<Vec<FavoritePlan>>().len(), 1);

    let response = app
        .client()
        .delete(&api_path(&format!("/favorites/{}", plan.id)))
        .add_header("Authorization", customer.bearer())
        .await;
    assert_eq!(response.status_code(), 200);

    let response = app
        .client()
        .delete(&api_path(&format!("/favorites/{}", plan.id)))
        .add_header("Authorization", customer.bearer())
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn provider_with_ordered_plans_cannot_be_deleted() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let customer = seed_customer(&app).await;
    let (provider, plan) = seed_catalog(&app).await;
    seed_esims(&app, plan.id, 1).await;
    place_order(&app, &customer, plan.id).await;

    // The plan cascade trips the order restriction; the API reports a
    // conflict instead of a bare database error.
    let response = app
        .client()
        .delete(&api_path(&format!("/providers/{}", provider.id)))
        .add_header("Authorization", admin.bearer())
        .await;
    assert_eq!(response.status_code(), 409, "{}", response.text());
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["code"], "CONFLICT");

    let response = app
        .client()
        .get(&api_path(&format!("/providers/{}", provider.id)))
        .add_header("Authorization", admin.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
}
