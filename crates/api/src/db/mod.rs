//! Database operations for `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users` - Accounts (unique email, username and slug)
//! - `personal_access_tokens` - Bearer tokens, stored as SHA-256 digests
//! - `products` - Catalog products
//!
//! # Stores
//!
//! Handlers talk to the [`UserStore`], [`TokenStore`] and [`ProductStore`]
//! traits. The `Pg*` types implement them on a connection pool.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p stockroom-cli -- migrate
//! ```

pub mod products;
pub mod tokens;
pub mod users;

#[cfg(test)]
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use products::{PgProductStore, ProductStore};
pub use tokens::{PgTokenStore, TokenStore};
pub use users::{PgUserStore, UserStore};

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const CONFLICT_SUFFIX: &str = " already in use";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Conflict on a unique `field`.
    #[must_use]
    pub fn conflict(field: &str) -> Self {
        Self::Conflict(format!("{field}{CONFLICT_SUFFIX}"))
    }

    /// The field named by a [`RepositoryError::conflict`], if this is one.
    #[must_use]
    pub fn conflict_field(&self) -> Option<&str> {
        match self {
            Self::Conflict(message) => message.strip_suffix(CONFLICT_SUFFIX),
            _ => None,
        }
    }
}

/// Map a sqlx error, turning unique violations into `Conflict` on the field
/// whose constraint fired.
pub(crate) fn map_unique_violation(e: sqlx::Error, fields: &[&str]) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let constraint = db_err.constraint().unwrap_or_default();
        let field = fields
            .iter()
            .find(|field| constraint.contains(**field))
            .copied()
            .unwrap_or("value");
        return RepositoryError::conflict(field);
    }
    RepositoryError::Database(e)
}

/// Convert a `COUNT(*)` result.
pub(crate) fn count_to_u64(count: i64) -> Result<u64, RepositoryError> {
    u64::try_from(count)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative row count: {count}")))
}

/// Handles to every store, shared through the application state.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub products: Arc<dyn ProductStore>,
}

impl Repositories {
    /// `PostgreSQL`-backed stores sharing one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            tokens: Arc::new(PgTokenStore::new(pool.clone())),
            products: Arc::new(PgProductStore::new(pool.clone())),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
