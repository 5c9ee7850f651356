//! Command implementations.

pub mod migrate;
pub mod seed;
pub mod token;
pub mod user;

use sqlx::PgPool;
use thiserror::Error;

use stockroom_api::config::{ApiConfig, ConfigError};
use stockroom_api::db::{self, Repositories, RepositoryError};
use stockroom_api::factories::FactoryError;
use stockroom_api::models::{PasswordError, User};
use stockroom_core::Email;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Factory(#[from] FactoryError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("No user found for: {0}")]
    UnknownUser(String),

    #[error("Invalid argument: {0}")]
    Invalid(String),
}

/// Connect to the database named by the environment.
pub async fn connect() -> Result<PgPool, CommandError> {
    let config = ApiConfig::from_env()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&config.database_url).await?)
}

/// Find a user by email or username.
pub async fn find_user(repos: &Repositories, login: &str) -> Result<User, CommandError> {
    let user = match Email::parse(login) {
        Ok(email) => repos.users.find_by_email(&email).await?,
        Err(_) => repos.users.find_by_username(login).await?,
    };
    user.ok_or_else(|| CommandError::UnknownUser(login.to_owned()))
}
