//! Integration tests for Stockroom.
//!
//! These drive a running `stockroom-api` over HTTP and are `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! # Prepare the database and start the server
//! stockroom migrate
//! cargo run -p stockroom-api
//!
//! # Run integration tests
//! cargo test -p stockroom-integration-tests -- --ignored
//! ```
//!
//! `STOCKROOM_TEST_URL` points the tests at another server
//! (default: `http://localhost:8000`).

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Password used for every account the tests register.
pub const PASSWORD: &str = "Integration1!";

/// HTTP client bound to the server under test.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new() -> Self {
        let base_url = std::env::var("STOCKROOM_TEST_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        Self {
            client: Client::builder()
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[must_use]
    pub fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    /// Register a fresh account and return `(username, email)`.
    ///
    /// # Panics
    ///
    /// Panics if registration does not return 201.
    pub async fn register(&self) -> (String, String) {
        let username = format!("it{}", Uuid::new_v4().simple());
        let email = format!("{username}@example.com");
        let resp = self
            .post("/api/register")
            .json(&json!({
                "first_name": "Integration",
                "email": email,
                "username": username,
                "password": PASSWORD,
                "password_confirmation": PASSWORD,
            }))
            .send()
            .await
            .expect("Failed to register");
        assert_eq!(resp.status(), StatusCode::CREATED);
        (username, email)
    }

    /// Log in and return the bearer token.
    ///
    /// # Panics
    ///
    /// Panics if login does not return 200 with a token.
    pub async fn login(&self, identifier: &str) -> String {
        let resp = self
            .post("/api/login")
            .json(&json!({ "email_or_username": identifier, "password": PASSWORD }))
            .send()
            .await
            .expect("Failed to log in");
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("Login response is not JSON");
        body["token"]
            .as_str()
            .expect("Login response has no token")
            .to_string()
    }

    /// Register a fresh account and log in as it.
    pub async fn fresh_user(&self) -> (String, String) {
        let (username, _) = self.register().await;
        let token = self.login(&username).await;
        (username, token)
    }
}
