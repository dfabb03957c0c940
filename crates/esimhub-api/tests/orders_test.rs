//! Order lifecycle integration tests: creation, the payment state machine,
//! atomic eSIM allocation and release.
//!
//! Run with: `cargo test -p esimhub-api --test orders_test`
//! Requires Docker for testcontainers (Postgres).

mod helpers;

use chrono::Duration;
use esimhub_core::models::{Esim, EsimStatus, Order, PaymentStatus, PurchaseStatus};
use futures::future::join_all;
use helpers::fixtures::{place_order, seed_admin, seed_catalog, seed_customer, seed_esims};
use helpers::{api_path, setup_test_app, TestApp};
use helpers::fixtures::TestUser;
use uuid::Uuid;

async fn complete_payment(
    app: &TestApp,
    admin: &TestUser,
    order_id: Uuid,
    transaction_id: &str,
) -> axum_test::TestResponse {
    app.client()
        .patch(&api_path(&format!("/orders/{}/payment", order_id)))
        .add_header("Authorization", admin.bearer())
        .json(&serde_json::json!({
            "payment_status": "completed",
            "transaction_id": transaction_id,
        }))
        .await
}

async fn fetch_order(app: &TestApp, order_id: Uuid) -> Order {
    app.state
        .orders
        .find_by_id(order_id)
        .await
        .expect("load order")
        .expect("order exists")
}

async fn fetch_esim(app: &TestApp, esim_id: Uuid) -> Esim {
    app.state
        .esims
        .get(esim_id)
        .await
        .expect("load esim")
        .expect("esim exists")
}

#[tokio::test]
async fn order_creation_copies_plan_price_and_computes_expiry() {
    let app = setup_test_app().await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;
    seed_esims(&app, plan.id, 1).await;

    let order = place_order(&app, &customer, plan.id).await;

    assert!(order.order_number.starts_with("ORD-"));
    assert_eq!(order.amount.to_string(), "19.99");
    assert_eq!(order.currency, "EUR");
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.purchase_status, PurchaseStatus::Pending);
    assert_eq!(order.esim_id, None);
    assert_eq!(order.expiry_date - order.activation_date, Duration::days(30));
}

#[tokio::test]
async fn order_creation_requires_available_inventory() {
    let app = setup_test_app().await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;

    // No esims provisioned for the plan at all.
    let response = app
        .client()
        .post(&api_path("/orders"))
        .add_header("Authorization", customer.bearer())
        .json(&serde_json::json!({ "plan_id": plan.id }))
        .await;
    assert_eq!(response.status_code(), 409);

    // Unknown plan.
    let response = app
        .client()
        .post(&api_path("/orders"))
        .add_header("Authorization", customer.bearer())
        .json(&serde_json::json!({ "plan_id": Uuid::new_v4() }))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn completed_payment_assigns_esim() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;
    let esims = seed_esims(&app, plan.id, 1).await;

    let order = place_order(&app, &customer, plan.id).await;

    let response = complete_payment(&app, &admin, order.id, "TXN-12345").await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    let updated = response.json::<Order>();

    assert_eq!(updated.payment_status, PaymentStatus::Completed);
    assert_eq!(updated.purchase_status, PurchaseStatus::CodeSent);
    assert_eq!(updated.esim_id, Some(esims[0].id));
    assert_eq!(updated.transaction_id.as_deref(), Some("TXN-12345"));
    assert!(updated.sent_at.is_some());

    let esim = fetch_esim(&app, esims[0].id).await;
    assert_eq!(esim.status, EsimStatus::Assigned);
}

#[tokio::test]
async fn exhausted_inventory_leaves_payment_pending() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;
    let esims = seed_esims(&app, plan.id, 1).await;

    // Both orders are created while the single esim is still available.
    let first = place_order(&app, &customer, plan.id).await;
    let second = place_order(&app, &customer, plan.id).await;

    let response = complete_payment(&app, &admin, first.id, "TXN-A").await;
    assert_eq!(response.status_code(), 200);

    let response = complete_payment(&app, &admin, second.id, "TXN-B").await;
    assert_eq!(response.status_code(), 409, "{}", response.text());
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["code"], "NO_INVENTORY");

    // The whole update rolled back: payment still pending, nothing bound.
    let second = fetch_order(&app, second.id).await;
    assert_eq!(second.payment_status, PaymentStatus::Pending);
    assert_eq!(second.esim_id, None);
    assert_eq!(second.transaction_id, None);

    let esim = fetch_esim(&app, esims[0].id).await;
    assert_eq!(esim.status, EsimStatus::Assigned);
}

#[tokio::test]
async fn completed_without_transaction_id_is_rejected() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;
    let esims = seed_esims(&app, plan.id, 1).await;

    let order = place_order(&app, &customer, plan.id).await;

    for body in [
        serde_json::json!({ "payment_status": "completed" }),
        serde_json::json!({ "payment_status": "completed", "transaction_id": "  " }),
    ] {
        let response = app
            .client()
            .patch(&api_path(&format!("/orders/{}/payment", order.id)))
            .add_header("Authorization", admin.bearer())
            .json(&body)
            .await;
        assert_eq!(response.status_code(), 400, "{}", response.text());
        assert_eq!(response.json::<serde_json::Value>()["code"], "MISSING_TRANSACTION_ID");
    }

    let order = fetch_order(&app, order.id).await;
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(fetch_esim(&app, esims[0].id).await.status, EsimStatus::Available);
}

#[tokio::test]
async fn invalid_transitions_are_rejected_over_http() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;
    seed_esims(&app, plan.id, 1).await;

    let order = place_order(&app, &customer, plan.id).await;

    // pending -> refunded skips completion.
    let response = app
        .client()
        .patch(&api_path(&format!("/orders/{}/payment", order.id)))
        .add_header("Authorization", admin.bearer())
        .json(&serde_json::json!({ "payment_status": "refunded" }))
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<serde_json::Value>()["code"], "INVALID_TRANSITION");

    // Resubmitting the current status is also rejected.
    let response = app
        .client()
        .patch(&api_path(&format!("/orders/{}/payment", order.id)))
        .add_header("Authorization", admin.bearer())
        .json(&serde_json::json!({ "payment_status": "pending" }))
        .await;
    assert_eq!(response.status_code(), 400);

    // Completed is terminal except for refund.
    complete_payment(&app, &admin, order.id, "TXN-1").await;
    let response = complete_payment(&app, &admin, order.id, "TXN-2").await;
    assert_eq!(response.status_code(), 400);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["code"], "INVALID_TRANSITION");
    assert!(body["error"].as_str().unwrap().contains("refunded"));
}

#[tokio::test]
async fn refund_releases_esim_and_expires_purchase() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;
    let esims = seed_esims(&app, plan.id, 1).await;

    let order = place_order(&app, &customer, plan.id).await;
    complete_payment(&app, &admin, order.id, "TXN-REFUND").await;

    let response = app
        .client()
        .patch(&api_path(&format!("/orders/{}/payment", order.id)))
        .add_header("Authorization", admin.bearer())
        .json(&serde_json::json!({ "payment_status": "refunded" }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    let refunded = response.json::<Order>();

    assert_eq!(refunded.payment_status, PaymentStatus::Refunded);
    assert_eq!(refunded.purchase_status, PurchaseStatus::Expired);
    assert_eq!(refunded.esim_id, None);
    assert_eq!(fetch_esim(&app, esims[0].id).await.status, EsimStatus::Available);
}

#[tokio::test]
async fn failing_payment_with_no_bound_esim_releases_nothing() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;
    let esims = seed_esims(&app, plan.id, 1).await;

    let order = place_order(&app, &customer, plan.id).await;

    // pending -> failed with nothing bound: the release half is a no-op.
    let response = app
        .client()
        .patch(&api_path(&format!("/orders/{}/payment", order.id)))
        .add_header("Authorization", admin.bearer())
        .json(&serde_json::json!({ "payment_status": "failed" }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    let failed = response.json::<Order>();

    assert_eq!(failed.payment_status, PaymentStatus::Failed);
    assert_eq!(failed.purchase_status, PurchaseStatus::Pending);
    assert_eq!(fetch_esim(&app, esims[0].id).await.status, EsimStatus::Available);
}

#[tokio::test]
async fn concurrent_completions_never_double_bind_an_esim() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;
    let esims = seed_esims(&app, plan.id, 3).await;

    let mut orders = Vec::new();
    for _ in 0..4 {
        orders.push(place_order(&app, &customer, plan.id).await);
    }

    // Four completions race for three esims.
    let responses = join_all(orders.iter().enumerate().map(|(i, order)| {
        let txn = format!("TXN-RACE-{}", i);
        let order_id = order.id;
        let app = &app;
        let admin = &admin;
        async move { complete_payment(app, admin, order_id, &txn).await }
    }))
    .await;

    let successes = responses.iter().filter(|r| r.status_code() == 200).count();
    let conflicts = responses.iter().filter(|r| r.status_code() == 409).count();
    assert_eq!(successes, 3, "exactly one completion per available esim");
    assert_eq!(conflicts, 1);

    let mut bound = Vec::new();
    for order in &orders {
        if let Some(esim_id) = fetch_order(&app, order.id).await.esim_id {
            bound.push(esim_id);
        }
    }
    bound.sort();
    bound.dedup();
    assert_eq!(bound.len(), 3, "no esim bound to two orders");

    for esim in &esims {
        assert_eq!(fetch_esim(&app, esim.id).await.status, EsimStatus::Assigned);
    }
}

#[tokio::test]
async fn deleting_an_order_releases_its_esim() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;
    let esims = seed_esims(&app, plan.id, 1).await;

    let order = place_order(&app, &customer, plan.id).await;
    complete_payment(&app, &admin, order.id, "TXN-DELETE").await;

    let response = app
        .client()
        .delete(&api_path(&format!("/orders/{}", order.id)))
        .add_header("Authorization", admin.bearer())
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());

    assert!(app
        .state
        .orders
        .find_by_id(order.id)
        .await
        .expect("query order")
        .is_none());
    assert_eq!(fetch_esim(&app, esims[0].id).await.status, EsimStatus::Available);
}

#[tokio::test]
async fn customers_only_see_their_own_orders() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let alice = seed_customer(&app).await;
    let bob = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;
    seed_esims(&app, plan.id, 2).await;

    let alice_order = place_order(&app, &alice, plan.id).await;
    place_order(&app, &bob, plan.id).await;

    // Listing is scoped to the caller.
    let response = app
        .client()
        .get(&api_path("/orders"))
        .add_header("Authorization", alice.bearer())
        .await;
    let orders = response.json::<Vec<Order>>();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, alice_order.id);

    // Another customer's order reads as absent, not forbidden.
    let response = app
        .client()
        .get(&api_path(&format!("/orders/{}", alice_order.id)))
        .add_header("Authorization", bob.bearer())
        .await;
    assert_eq!(response.status_code(), 404);

    // Admins see everything.
    let response = app
        .client()
        .get(&api_path("/orders"))
        .add_header("Authorization", admin.bearer())
        .await;
    assert_eq!(response.json::<Vec<Order>>().len(), 2);

    // Payment transitions are admin-only.
    let response = app
        .client()
        .patch(&api_path(&format!("/orders/{}/payment", alice_order.id)))
        .add_header("Authorization", alice.bearer())
        .json(&serde_json::json!({ "payment_status": "completed", "transaction_id": "TXN-X" }))
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn order_lookup_by_number() {
    let app = setup_test_app().await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;
    seed_esims(&app, plan.id, 1).await;

    let order = place_order(&app, &customer, plan.id).await;

    let response = app
        .client()
        .get(&api_path(&format!("/orders/number/{}", order.order_number)))
        .add_header("Authorization", customer.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["id"], serde_json::json!(order.id));
    assert!(body["esim"].is_null());
}

#[tokio::test]
async fn duplicate_completions_of_one_order_bind_one_esim() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;
    let esims = seed_esims(&app, plan.id, 2).await;

    let order = place_order(&app, &customer, plan.id).await;

    // A retried payment webhook delivers the same completion twice. Only one
    // delivery may claim an eSIM; the duplicate must not bind a second one.
    let responses = join_all((0..2).map(|i| {
        let txn = format!("TXN-DUP-{}", i);
        let order_id = order.id;
        let app = &app;
        let admin = &admin;
        async move { complete_payment(app, admin, order_id, &txn).await }
    }))
    .await;

    let successes = responses
        .iter()
        .filter(|r| r.status_code() == 200)
        .count();
    assert_eq!(successes, 1, "exactly one delivery wins");
    for response in &responses {
        assert!(
            [200, 400, 409].contains(&response.status_code().as_u16()),
            "{}",
            response.text()
        );
    }

    let order = fetch_order(&app, order.id).await;
    assert_eq!(order.payment_status, PaymentStatus::Completed);
    let bound = order.esim_id.expect("winning delivery bound an esim");

    // Exactly one inventory row ends up assigned, and it is the bound one.
    let mut assigned = Vec::new();
    for esim in &esims {
        if fetch_esim(&app, esim.id).await.status == EsimStatus::Assigned {
            assigned.push(esim.id);
        }
    }
    assert_eq!(assigned, vec![bound], "duplicate delivery leaked an esim");
}

#[tokio::test]
async fn stale_payment_write_misses_its_guard() {
    let app = setup_test_app().await;
    let admin = seed_admin(&app).await;
    let customer = seed_customer(&app).await;
    let (_, plan) = seed_catalog(&app).await;
    seed_esims(&app, plan.id, 2).await;

    let order = place_order(&app, &customer, plan.id).await;
    let response = complete_payment(&app, &admin, order.id, "TXN-FIRST").await;
    assert_eq!(response.status_code(), 200, "{}", response.text());

    // A writer still holding the pending snapshot finds no matching row.
    let mut tx = app.pool.begin().await.expect("begin");
    let updated = app
        .state
        .orders
        .update_payment_fields_tx(
            &mut tx,
            order.id,
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            Some("TXN-STALE"),
            None,
        )
        .await
        .expect("guarded update");
    assert!(updated.is_none());
    tx.rollback().await.expect("rollback");

    let order = fetch_order(&app, order.id).await;
    assert_eq!(order.transaction_id.as_deref(), Some("TXN-FIRST"));
}
