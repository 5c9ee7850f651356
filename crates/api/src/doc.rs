//! OpenAPI document and Swagger UI.
//!
//! [`ApiDoc`] collects every route's `#[utoipa::path]` annotation together
//! with the wire shapes in [`crate::routes::schemas`]. [`swagger_ui`] serves
//! the interactive docs at `/api/docs` and the raw document at
//! `/api/openapi.json`.

use axum::Router;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::routes::schemas::{
    ErrorMessageSchema, ErrorSchema, LoginRequest, LoginResponse, PageLinksSchema,
    PageMetaSchema, ProductPageSchema, ProductRequest, ProductSchema, ProductUpload,
    RegisterRequest, SuccessSchema, UserCreatedSchema, UserPageSchema, UserSchema,
    UserSummarySchema, UserUpdateRequest, ValidationErrorSchema,
};

/// Swagger UI mount point.
pub const DOCS_PATH: &str = "/api/docs";

/// Where the JSON document is served.
pub const OPENAPI_PATH: &str = "/api/openapi.json";

/// Name of the bearer token scheme referenced by protected operations.
pub const BEARER_SCHEME: &str = "bearer";

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Stockroom API",
        description = "Token-authenticated JSON API for user accounts and a product catalog. \
            Obtain a token from POST /api/login and send it as `Authorization: Bearer <token>`.",
        license(name = "MIT OR Apache-2.0")
    ),
    servers((url = "/", description = "Relative to the deployment base URL")),
    security(("bearer" = [])),
    paths(
        crate::routes::health,
        crate::routes::readiness,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::users::index,
        crate::routes::users::store,
        crate::routes::users::show,
        crate::routes::users::update,
        crate::routes::users::destroy,
        crate::routes::products::index,
        crate::routes::products::store,
        crate::routes::products::show,
        crate::routes::products::update,
        crate::routes::products::destroy,
    ),
    components(schemas(
        UserSchema,
        UserSummarySchema,
        UserPageSchema,
        UserCreatedSchema,
        UserUpdateRequest,
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        SuccessSchema,
        ProductSchema,
        ProductPageSchema,
        ProductRequest,
        ProductUpload,
        PageLinksSchema,
        PageMetaSchema,
        ValidationErrorSchema,
        ErrorMessageSchema,
        ErrorSchema,
    )),
    tags(
        (name = "auth", description = "Registration and bearer tokens"),
        (name = "users", description = "User accounts"),
        (name = "products", description = "Product catalog and images"),
        (name = "health", description = "Liveness and readiness checks")
    )
)]
pub struct ApiDoc;

/// Swagger UI and the OpenAPI document, for merging into the app router.
pub fn swagger_ui<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new(DOCS_PATH)
        .url(OPENAPI_PATH, ApiDoc::openapi())
        .into()
}
