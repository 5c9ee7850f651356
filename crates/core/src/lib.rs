//! Stockroom Core - Shared types library.
//!
//! This crate provides the domain types used across all Stockroom components:
//! - `api` - JSON API server (auth, users, products)
//! - `cli` - Command-line tools for migrations, seeding and token management
//!
//! # Architecture
//!
//! The core crate contains only types and pure validation logic - no I/O, no
//! database access, no HTTP. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, prices, token abilities and pages
//! - [`password`] - Password strength policy
//! - [`slug`] - URL-safe slug generation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod password;
pub mod slug;
pub mod types;

pub use password::{PasswordPolicyError, PasswordViolation, validate_password_strength};
pub use types::*;
