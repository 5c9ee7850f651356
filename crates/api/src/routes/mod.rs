//! HTTP routes.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness
//! GET    /health/ready            - Readiness (database reachable)
//! GET    /storage/*               - Uploaded files
//! GET    /api/docs                - Swagger UI
//! GET    /api/openapi.json        - OpenAPI document
//!
//! # Auth
//! POST   /api/register            - Register (public)
//! POST   /api/login               - Exchange credentials for a bearer token (public)
//! POST   /api/logout              - Revoke the current token
//!
//! # Users
//! GET    /api/user                - Paginated list
//! POST   /api/user                - Create (public)
//! GET    /api/user/{user}         - Show by id, username or slug
//! PUT    /api/user/{user}         - Update by id or slug (self or staff)
//! PATCH  /api/user/{user}
//! DELETE /api/user/{user}         - Delete by id or slug (self or staff)
//!
//! # Products
//! GET    /api/products            - Paginated list, newest first
//! POST   /api/products            - Create (JSON or multipart with image)
//! GET    /api/products/{product}  - Show
//! PUT    /api/products/{product}  - Update provided fields
//! PATCH  /api/products/{product}
//! DELETE /api/products/{product}  - Delete row and image
//! ```

pub mod auth;
pub mod products;
pub mod schemas;
pub mod users;

#[cfg(test)]
mod tests;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Request, Response, StatusCode, header::X_CONTENT_TYPE_OPTIONS},
    middleware,
    routing::{get, post},
};
use tower_http::{
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::doc;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Room for multipart framing and text fields on top of the image itself.
const BODY_OVERHEAD: usize = 1024 * 1024;

/// The `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/user", get(users::index).post(users::store))
        .route(
            "/user/{user}",
            get(users::show)
                .put(users::update)
                .patch(users::update)
                .delete(users::destroy),
        )
        .route("/products", get(products::index).post(products::store))
        .route(
            "/products/{product}",
            get(products::show)
                .put(products::update)
                .patch(products::update)
                .delete(products::destroy),
        )
}

/// The complete application, ready to serve.
pub fn router(state: AppState) -> Router {
    let storage_dir = state.config().storage_dir.clone();
    let body_limit = state
        .config()
        .max_upload_bytes
        .saturating_add(BODY_OVERHEAD);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
        .merge(doc::swagger_ui())
        .nest_service("/storage", ServeDir::new(storage_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is running", body = String)),
    tags = ["health"],
    security(())
)]
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Database reachable"),
        (status = 503, description = "Database unreachable")
    ),
    tags = ["health"],
    security(())
)]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.repos().users.count().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
