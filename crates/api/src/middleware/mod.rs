//! HTTP middleware.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. `TraceLayer` (request span and response log)
//! 3. Request ID
//! 4. Body limit and response headers
//!
//! Authentication is an extractor ([`RequireAuth`]) rather than a layer, so
//! public and protected routes share one router.

pub mod auth;
pub mod request_id;

pub use auth::RequireAuth;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
