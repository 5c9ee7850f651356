#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde_json::json;

use stockroom_core::Abilities;

use crate::factories::ProductFactory;
use crate::test_support::{PASSWORD, PNG, TestApp, create_user};

fn registration(email: &str, username: &str, password: &str) -> serde_json::Value {
    json!({
        "first_name": "Jane",
        "last_name": "Doe",
        "email": email,
        "username": username,
        "password": password,
        "password_confirmation": password,
    })
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.json(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, _) = app.json(Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::new();
    let (status, body) = app.json(Method::GET, "/api/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "Stockroom API");
    assert!(body["paths"]["/api/products"]["post"].is_object());
    assert!(body["components"]["securitySchemes"]["bearer"].is_object());

    let (status, _) = app.json(Method::GET, "/api/docs/", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_longest_email_registers() {
    let app = TestApp::new();
    let email = format!("{}@a.com", "x".repeat(249));
    let (status, body) = app
        .json(
            Method::POST,
            "/api/user",
            None,
            Some(registration(&email, "longest", PASSWORD)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user"]["email"], email.as_str());

    let token = app.login("longest").await;
    let (status, body) = app
        .json(Method::GET, "/api/user/longest", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["slug"].as_str().unwrap().len() <= 255);
}

#[tokio::test]
async fn test_register_then_login() {
    let app = TestApp::new();
    let (status, body) = app
        .json(
            Method::POST,
            "/api/register",
            None,
            Some(registration("jane@example.com", "jane", PASSWORD)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(
        body["success"],
        "User created successfully. Please verify your email to activate your account."
    );

    let (status, body) = app
        .json(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email_or_username": "jane@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], "Login successful.");
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["token"].as_str().unwrap().contains('|'));
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn test_register_lists_every_password_rule() {
    let app = TestApp::new();
    let (status, body) = app
        .json(
            Method::POST,
            "/api/register",
            None,
            Some(registration("jane@example.com", "jane", "abc")),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["errors"]["password"],
        json!([
            "Password must be at least 8 characters.",
            "Password must contain at least one uppercase letter.",
            "Password must contain at least one number.",
            "Password must contain at least one special character.",
        ])
    );
}

#[tokio::test]
async fn test_register_rejects_duplicates() {
    let app = TestApp::new();
    create_user(app.repos(), "jane@example.com", "jane").await;
    let (status, body) = app
        .json(
            Method::POST,
            "/api/register",
            None,
            Some(registration("jane@example.com", "jane", PASSWORD)),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["errors"]["email"],
        json!(["The email address is already in use."])
    );
    assert_eq!(
        body["errors"]["username"],
        json!(["The username is already taken."])
    );
}

#[tokio::test]
async fn test_login_failures_share_one_message() {
    let app = TestApp::new();
    let mut inactive = create_user(app.repos(), "off@example.com", "off").await;
    inactive.is_active = false;
    app.repos().users.update(&inactive).await.unwrap();
    create_user(app.repos(), "jane@example.com", "jane").await;

    for (identifier, password) in [
        ("nobody@example.com", PASSWORD),
        ("jane", "Wrong-password1"),
        ("off@example.com", PASSWORD),
    ] {
        let (status, body) = app
            .json(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "email_or_username": identifier, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{identifier}");
        assert_eq!(
            body["errors"]["email_or_username"],
            json!(["These credentials do not match our records."]),
            "{identifier}"
        );
    }
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = TestApp::new();
    create_user(app.repos(), "jane@example.com", "jane").await;
    let token = app.login("jane").await;

    let (status, body) = app
        .json(Method::POST, "/api/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], "Successfully logged out.");

    let (status, body) = app
        .json(Method::GET, "/api/user", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errors"], "You are not authenticated");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new();
    for uri in ["/api/user", "/api/products", "/api/user/1"] {
        let (status, _) = app.json(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
    let (status, _) = app
        .json(Method::GET, "/api/user", Some("1|not-a-real-secret"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_cannot_update_another_user() {
    let app = TestApp::new();
    create_user(app.repos(), "jane@example.com", "jane").await;
    let joe = create_user(app.repos(), "joe@example.com", "joe").await;
    let token = app.login("jane").await;

    let (status, body) = app
        .json(
            Method::PUT,
            &format!("/api/user/{}", joe.id),
            Some(&token),
            Some(json!({ "first_name": "Hacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errors"], "You are not authorized to update this user.");

    let (status, _) = app
        .json(Method::DELETE, "/api/user/joe-at-examplecom", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_updates_and_deletes_self() {
    let app = TestApp::new();
    let jane = create_user(app.repos(), "jane@example.com", "jane").await;
    let token = app.login("jane").await;

    let (status, body) = app
        .json(
            Method::PATCH,
            &format!("/api/user/{}", jane.id),
            Some(&token),
            Some(json!({ "first_name": "Janet" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["first_name"], "Janet");
    assert!(body.get("password").is_none());

    let (status, body) = app
        .json(Method::DELETE, "/api/user/jane", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "usernames do not address writes");
    assert_eq!(body["error"], "User not found");

    let (status, _) = app
        .json(Method::DELETE, "/api/user/jane-at-examplecom", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.repos().users.find_by_id(jane.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_show_user_by_username() {
    let app = TestApp::new();
    create_user(app.repos(), "jane@example.com", "jane").await;
    let token = app.login("jane").await;

    let (status, body) = app
        .json(Method::GET, "/api/user/jane", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "jane-at-examplecom");

    let (status, body) = app
        .json(Method::GET, "/api/user/nobody", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "User not found" }));
}

#[tokio::test]
async fn test_token_scope_is_enforced() {
    let app = TestApp::new();
    let jane = create_user(app.repos(), "jane@example.com", "jane").await;
    let issued = app
        .state
        .tokens()
        .issue(&jane, "reader", Abilities::new([Abilities::PRODUCTS_READ]), None)
        .await
        .unwrap();
    let token = issued.plaintext.expose_secret();

    let (status, _) = app
        .json(Method::GET, "/api/products", Some(token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .json(
            Method::POST,
            "/api/products",
            Some(token),
            Some(json!({ "name": "Widget", "price": 5, "stock": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errors"], "This action is unauthorized.");

    let (status, _) = app
        .json(Method::GET, "/api/user", Some(token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_product_pages_hold_ten() {
    let app = TestApp::new();
    create_user(app.repos(), "jane@example.com", "jane").await;
    for _ in 0..15 {
        let product = ProductFactory::new().build().unwrap();
        app.repos().products.create(product).await.unwrap();
    }
    let token = app.login("jane").await;

    let (status, body) = app
        .json(Method::GET, "/api/products", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    assert_eq!(body["meta"]["total"], 15);
    assert_eq!(body["meta"]["last_page"], 2);
    assert_eq!(body["links"]["next"], "http://api.test/api/products?page=2");

    let (_, body) = app
        .json(Method::GET, "/api/products?page=2", Some(&token), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["meta"]["from"], 11);
    assert!(body["links"]["next"].is_null());
}

#[tokio::test]
async fn test_products_list_newest_first() {
    let app = TestApp::new();
    create_user(app.repos(), "jane@example.com", "jane").await;
    for n in 0..15 {
        let product = ProductFactory::new().name(format!("Item {n}")).build().unwrap();
        app.repos().products.create(product).await.unwrap();
    }
    let token = app.login("jane").await;

    let (_, body) = app
        .json(Method::GET, "/api/products", Some(&token), None)
        .await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|product| product["name"].as_str().unwrap())
        .collect();
    let expected: Vec<String> = (5..15).rev().map(|n| format!("Item {n}")).collect();
    assert_eq!(names, expected);

    let (_, body) = app
        .json(Method::GET, "/api/products?page=2", Some(&token), None)
        .await;
    assert_eq!(body["data"][0]["name"], "Item 4");
    assert_eq!(body["data"][4]["name"], "Item 0");
}

#[tokio::test]
async fn test_user_pages_hold_ten_without_passwords() {
    let app = TestApp::new();
    create_user(app.repos(), "jane@example.com", "jane").await;
    for n in 0..14 {
        create_user(app.repos(), &format!("user{n}@example.com"), &format!("user{n}")).await;
    }
    let token = app.login("jane").await;

    let (status, body) = app.json(Method::GET, "/api/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 10);
    for user in users {
        let fields = user.as_object().unwrap();
        assert!(fields.contains_key("slug"));
        assert!(
            fields.keys().all(|key| !key.contains("password")),
            "{user}"
        );
    }
    assert_eq!(body["meta"]["total"], 15);
    assert_eq!(body["meta"]["per_page"], 10);
    assert_eq!(body["meta"]["last_page"], 2);
    assert_eq!(body["links"]["next"], "http://api.test/api/user?page=2");

    let (_, body) = app
        .json(Method::GET, "/api/user?page=2", Some(&token), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert!(body["links"]["next"].is_null());
}

#[tokio::test]
async fn test_product_image_lifecycle() {
    let app = TestApp::new();
    create_user(app.repos(), "jane@example.com", "jane").await;
    let token = app.login("jane").await;

    let (status, created) = app
        .multipart(
            Method::POST,
            "/api/products",
            &token,
            &[("name", "Widget"), ("price", "9.99"), ("stock", "3")],
            Some(("widget.png", "image/png", PNG)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["price"], 9.99);
    let image = created["image"].as_str().unwrap().to_string();
    assert!(image.starts_with("/storage/products/"));

    let (status, served) = app.json(Method::GET, &image, None, None).await;
    assert_eq!(status, StatusCode::OK, "{served}");

    let uri = format!("/api/products/{}", created["id"]);
    let (status, updated) = app
        .json(
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "stock": 7 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["stock"], 7);
    assert_eq!(updated["image"], image.as_str());

    let (status, _) = app.json(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.json(Method::GET, &image, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.json(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Product not found" }));
}

#[tokio::test]
async fn test_product_image_rules() {
    let app = TestApp::new();
    create_user(app.repos(), "jane@example.com", "jane").await;
    let token = app.login("jane").await;
    let fields = [("name", "Widget"), ("price", "1"), ("stock", "1")];

    let (status, body) = app
        .multipart(
            Method::POST,
            "/api/products",
            &token,
            &fields,
            Some(("notes.txt", "text/plain", b"hello")),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["errors"]["image"],
        json!(["The image field must be a file of type: jpeg, png, gif, bmp, webp."])
    );

    let large = vec![0_u8; 5 * 1024];
    let (status, body) = app
        .multipart(
            Method::POST,
            "/api/products",
            &token,
            &fields,
            Some(("big.png", "image/png", &large)),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["errors"]["image"],
        json!(["The image field must not be greater than 4 kilobytes."])
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].is_string());
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(crate::routes::router(app.state.clone()), request)
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}
