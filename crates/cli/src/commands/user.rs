//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! # Password taken from STOCKROOM_NEW_USER_PASSWORD, or generated and printed once
//! stockroom user create -e admin@example.com -u admin --staff
//!
//! # Import a credential hashed elsewhere
//! stockroom user create -e ops@example.com -u ops --password-hash '$argon2id$v=19$...'
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;

use stockroom_api::db::Repositories;
use stockroom_api::factories::UserFactory;
use stockroom_api::models::HashedPassword;
use stockroom_core::Email;
use stockroom_core::slug::candidates;

use super::{CommandError, connect};

/// Variable holding the password for `user create`.
const PASSWORD_VAR: &str = "STOCKROOM_NEW_USER_PASSWORD";

/// Create an active user.
///
/// # Errors
///
/// Returns `CommandError::UserExists` if the email or username is taken, or
/// `CommandError::Password` if the password or hash is rejected.
pub async fn create(
    email: &str,
    username: &str,
    staff: bool,
    password_hash: Option<&str>,
) -> Result<(), CommandError> {
    let parsed = Email::parse(email).map_err(|e| CommandError::Invalid(e.to_string()))?;
    let username = username.trim();
    if username.is_empty() {
        return Err(CommandError::Invalid("username must not be empty".to_owned()));
    }

    let (password, generated) = match password_hash {
        Some(hash) => (HashedPassword::from_hash(hash)?, None),
        None => match std::env::var(PASSWORD_VAR) {
            Ok(plaintext) if !plaintext.is_empty() => {
                (HashedPassword::from_plaintext(&plaintext)?, None)
            }
            _ => {
                let plaintext = generate_password();
                (HashedPassword::from_plaintext(&plaintext)?, Some(plaintext))
            }
        },
    };

    let pool = connect().await?;
    let repos = Repositories::postgres(&pool);

    if repos.users.email_taken(&parsed, None).await? {
        return Err(CommandError::UserExists(email.to_owned()));
    }
    if repos.users.username_taken(username, None).await? {
        return Err(CommandError::UserExists(username.to_owned()));
    }

    let mut factory = UserFactory::new().email(email).username(username);
    if staff {
        factory = factory.staff();
    }
    let mut new = factory.new_user()?;
    new.first_name = None;
    new.last_name = None;
    new.password = password;
    new.slug = free_slug(&repos, &new.slug).await?;

    let user = repos.users.create(new).await?;
    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Staff: {}",
        user.id,
        user.email,
        user.is_staff
    );

    if let Some(plaintext) = generated {
        #[allow(clippy::print_stdout)]
        {
            println!("Generated password (shown once): {plaintext}");
        }
    }

    pool.close().await;
    Ok(())
}

async fn free_slug(repos: &Repositories, base: &str) -> Result<String, CommandError> {
    for candidate in candidates(base) {
        if !repos.users.slug_taken(&candidate, None).await? {
            return Ok(candidate);
        }
    }
    Err(CommandError::Invalid(format!("no free slug for {base}")))
}

/// A random password that satisfies the strength policy.
fn generate_password() -> String {
    let bytes: [u8; 18] = rand::rng().random();
    format!("{}Aa1!", URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_meets_policy() {
        for _ in 0..20 {
            let password = generate_password();
            assert!(stockroom_core::validate_password_strength(&password).is_ok());
            assert_eq!(password.len(), 28);
        }
    }
}
