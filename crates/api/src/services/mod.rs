//! Business logic, independent of HTTP.
//!
//! Services borrow the stores they need from [`crate::db::Repositories`]
//! and are cheap to construct per request.

pub mod auth;
pub mod authorization;
pub mod products;
pub mod tokens;
pub mod users;
