//! Registration, login and logout against a running server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The API server running (cargo run -p stockroom-api)

use reqwest::StatusCode;
use serde_json::{Value, json};

use stockroom_integration_tests::{PASSWORD, TestContext};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_health() {
    let ctx = TestContext::new();
    let resp = ctx
        .client
        .get(ctx.url("/health/ready"))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_login_by_email_and_username() {
    let ctx = TestContext::new();
    let (username, email) = ctx.register().await;

    let by_email = ctx.login(&email).await;
    let by_username = ctx.login(&username).await;
    assert_ne!(by_email, by_username);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_duplicate_registration_is_rejected() {
    let ctx = TestContext::new();
    let (username, email) = ctx.register().await;

    let resp = ctx
        .post("/api/register")
        .json(&json!({
            "email": email,
            "username": username,
            "password": PASSWORD,
            "password_confirmation": PASSWORD,
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.expect("Invalid JSON");
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["username"].is_array());
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_wrong_password_is_rejected() {
    let ctx = TestContext::new();
    let (username, _) = ctx.register().await;

    let resp = ctx
        .post("/api/login")
        .json(&json!({ "email_or_username": username, "password": "Wrong-pass1!" }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_logout_revokes_token() {
    let ctx = TestContext::new();
    let (_, token) = ctx.fresh_user().await;

    let resp = ctx
        .post("/api/logout")
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx
        .get("/api/user", &token)
        .send()
        .await
        .expect("Failed to list users");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
