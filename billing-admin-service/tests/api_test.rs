//! End-to-end tests against PostgreSQL.
//!
//! Run with `TEST_DATABASE_URL` pointing at a disposable database:
//! `cargo test -p billing-admin-service --test api_test -- --ignored`

mod common;

use billing_admin_service::services::Role;
use common::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn create(app: &TestApp, path: &str, body: Value) -> Value {
    let response = app.post(path, body).await;
    assert_eq!(response.status(), StatusCode::CREATED, "POST {}", path);
    response.json().await.unwrap()
}

/// Two customers on one package, with invoices for both.
async fn seed(app: &TestApp) -> (Value, Value, Value) {
    let package = create(
        app,
        "/packages",
        json!({ "name": "Home", "price": 150000, "speed": "10Mbps" }),
    )
    .await;
    let alice = create(
        app,
        "/customers",
        json!({ "name": "Alice", "address": "Jl. Merdeka 1", "phone": "0812000001", "package_id": package["id"] }),
    )
    .await;
    let bob = create(
        app,
        "/customers",
        json!({ "name": "Bob", "address": "Jl. Merdeka 2", "phone": "0812000002", "package_id": package["id"] }),
    )
    .await;

    for (customer, month, paid_on) in [
        (&alice, 1, Some("2024-01-05")),
        (&alice, 2, None),
        (&bob, 1, Some("2024-01-07")),
    ] {
        create(
            app,
            "/invoices",
            json!({
                "customer_id": customer["id"],
                "package_id": package["id"],
                "year": 2024,
                "month": month,
                "paid_on": paid_on
            }),
        )
        .await;
    }

    (package, alice, bob)
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn admin_pages_through_invoices() {
    let app = TestApp::spawn().await;
    seed(&app).await;

    let response = app
        .get_as("/invoices?size=2&page=2&sort=month&direction=asc", &admin_token())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await.unwrap();

    assert_eq!(page["total_elements"], 3);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["number_of_elements"], 1);
    assert_eq!(page["is_last"], true);
    assert_eq!(page["is_first"], false);
    assert_eq!(page["content"][0]["month"], 2);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn user_only_sees_own_invoices() {
    let app = TestApp::spawn().await;
    let (_, alice, bob) = seed(&app).await;
    let alice_token = token(Role::User, alice["id"].as_str().map(str::to_string));

    // Asking for Bob's invoices still returns only Alice's.
    let path = format!("/invoices?customer_id={}", bob["id"].as_str().unwrap());
    let page: Value = app.get_as(&path, &alice_token).await.json().await.unwrap();

    assert_eq!(page["total_elements"], 2);
    for invoice in page["content"].as_array().unwrap() {
        assert_eq!(invoice["customer"]["name"], "Alice");
    }

    let summary: Value = app
        .get_as("/invoices/summary/2024", &alice_token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(summary.as_array().unwrap().len(), 2);
    assert_eq!(summary[0]["customer_id"], summary[1]["customer_id"]);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn duplicate_package_is_conflict() {
    let app = TestApp::spawn().await;
    let body = json!({ "name": "Office", "price": 500000, "speed": "50Mbps" });

    create(&app, "/packages", body.clone()).await;
    let response = app.post("/packages", body).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn referenced_package_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let (package, _, _) = seed(&app).await;

    let response = app
        .client
        .delete(format!(
            "{}/packages/{}",
            app.address,
            package["id"].as_str().unwrap()
        ))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn filters_narrow_the_page() {
    let app = TestApp::spawn().await;
    seed(&app).await;
    create(
        &app,
        "/packages",
        json!({ "name": "Business", "price": 900000, "speed": "100Mbps" }),
    )
    .await;

    let page: Value = app
        .get_as("/packages?name=bus", &admin_token())
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(page["total_elements"], 1);
    assert_eq!(page["content"][0]["name"], "Business");
}
