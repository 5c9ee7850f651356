//! Shared fixtures for unit and router tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Map, Value};
use tower::ServiceExt;

use crate::config::ApiConfig;
use crate::db::Repositories;
use crate::factories::{DEFAULT_PASSWORD, UserFactory};
use crate::models::User;
use crate::routes;
use crate::state::AppState;
use crate::storage::LocalStorage;

/// Password of every user made by [`create_user`].
pub const PASSWORD: &str = DEFAULT_PASSWORD;

/// A 1x1 transparent PNG.
pub const PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

const BOUNDARY: &str = "stockroom-test-boundary";

/// Unwrap a `json!` object literal.
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Insert an active, non-staff user with [`PASSWORD`].
pub async fn create_user(repos: &Repositories, email: &str, username: &str) -> User {
    let new = UserFactory::new()
        .email(email)
        .username(username)
        .new_user()
        .unwrap();
    repos.users.create(new).await.unwrap()
}

/// The full router over in-memory stores and a scratch storage directory.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    _dir: tempfile::TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let vars = HashMap::from([
            ("STOCKROOM_DATABASE_URL", "postgres://unused/stockroom".to_string()),
            ("STOCKROOM_BASE_URL", "http://api.test".to_string()),
            ("STOCKROOM_STORAGE_DIR", dir.path().display().to_string()),
            ("STOCKROOM_MAX_UPLOAD_KB", "4".to_string()),
        ]);
        let config = ApiConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()));
        let state = AppState::new(config, Repositories::memory(), storage);
        Self {
            router: routes::router(state.clone()),
            state,
            _dir: dir,
        }
    }

    pub fn repos(&self) -> &Repositories {
        self.state.repos()
    }

    /// Send a request and return the status with the body parsed as JSON
    /// (`Null` when empty, a string when not JSON).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        fields: &[(&str, &str)],
        image: Option<(&str, &str, &[u8])>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(fields, image)))
            .unwrap();
        self.send(request).await
    }

    /// Log in through the API and return the plaintext bearer token.
    pub async fn login(&self, identifier: &str) -> String {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/login",
                None,
                Some(serde_json::json!({
                    "email_or_username": identifier,
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }
}

fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
