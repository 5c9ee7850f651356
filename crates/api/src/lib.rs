//! Stockroom API library.
//!
//! Token-authenticated JSON API for user accounts and a product catalog
//! with image uploads. The binary in `main.rs` wires configuration,
//! tracing and Sentry around [`routes::router`]; the CLI reuses the
//! stores, services and factories.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod doc;
pub mod error;
pub mod factories;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod validation;

#[cfg(test)]
mod test_support;
