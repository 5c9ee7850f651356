//! Seed the database with demo accounts and factory data.
//!
//! Always ensures two accounts exist, both with the factory password:
//!
//! - `admin@example.com` (`admin`), staff
//! - `test@example.com` (`testuser`), regular
//!
//! Existing accounts are left untouched, so the command can be re-run.

use stockroom_api::db::Repositories;
use stockroom_api::factories::{DEFAULT_PASSWORD, ProductFactory, UserFactory};
use stockroom_core::Email;

use super::{CommandError, connect};

/// Fresh draws per random user when a generated one collides.
const USER_ATTEMPTS: usize = 3;

struct Account {
    first: &'static str,
    last: &'static str,
    email: &'static str,
    username: &'static str,
    staff: bool,
}

const ACCOUNTS: [Account; 2] = [
    Account {
        first: "Admin",
        last: "User",
        email: "admin@example.com",
        username: "admin",
        staff: true,
    },
    Account {
        first: "Base",
        last: "User",
        email: "test@example.com",
        username: "testuser",
        staff: false,
    },
];

/// Seed demo accounts, `users` random users and `products` products.
///
/// # Errors
///
/// Returns `CommandError` on connection or insert failures.
pub async fn run(users: u32, products: u32) -> Result<(), CommandError> {
    let pool = connect().await?;
    let repos = Repositories::postgres(&pool);

    for account in &ACCOUNTS {
        seed_account(&repos, account).await?;
    }

    for _ in 0..users {
        seed_user(&repos).await?;
    }
    if users > 0 {
        tracing::info!(count = users, "Seeded users");
    }

    for _ in 0..products {
        repos.products.create(ProductFactory::new().build()?).await?;
    }
    if products > 0 {
        tracing::info!(count = products, "Seeded products");
    }

    pool.close().await;
    Ok(())
}

async fn seed_user(repos: &Repositories) -> Result<(), CommandError> {
    for _ in 0..USER_ATTEMPTS {
        match repos.users.create(UserFactory::new().new_user()?).await {
            Err(e) if e.conflict_field().is_some() => {
                tracing::debug!(error = %e, "Generated user collided, drawing again");
            }
            result => {
                result?;
                return Ok(());
            }
        }
    }
    Err(CommandError::Invalid(
        "could not generate a unique user".to_string(),
    ))
}

async fn seed_account(repos: &Repositories, account: &Account) -> Result<(), CommandError> {
    let email = Email::parse(account.email).map_err(|e| CommandError::Invalid(e.to_string()))?;
    if repos.users.find_by_email(&email).await?.is_some() {
        tracing::info!(email = account.email, "Account exists, skipping");
        return Ok(());
    }

    let mut factory = UserFactory::new()
        .name(account.first, account.last)
        .email(account.email)
        .username(account.username);
    if account.staff {
        factory = factory.staff();
    }
    let user = repos.users.create(factory.new_user()?).await?;

    tracing::info!(
        user_id = %user.id,
        email = account.email,
        staff = account.staff,
        "Seeded account (password: {DEFAULT_PASSWORD})"
    );
    Ok(())
}
