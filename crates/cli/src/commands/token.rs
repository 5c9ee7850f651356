//! Personal access token commands.
//!
//! # Usage
//!
//! ```bash
//! # Full-access token that never expires
//! stockroom token create -u admin
//!
//! # Read-only catalog token valid for 30 days
//! stockroom token create -u admin -a products:read --ttl-hours 720 --name storefront
//!
//! # Delete tokens that expired more than 24 hours ago
//! stockroom token prune
//! ```

use chrono::{Duration, Utc};
use secrecy::ExposeSecret;

use stockroom_api::db::Repositories;
use stockroom_api::services::tokens::TokenIssuer;
use stockroom_core::Abilities;

use super::{CommandError, connect, find_user};

/// Issue a token for the user with email or username `login`.
///
/// # Errors
///
/// Returns `CommandError::UnknownUser` if no such user exists, or
/// `CommandError::Invalid` for an unknown ability.
pub async fn create(
    login: &str,
    abilities: Vec<String>,
    ttl_hours: Option<u32>,
    name: &str,
) -> Result<(), CommandError> {
    let abilities = parse_abilities(abilities)?;

    let pool = connect().await?;
    let repos = Repositories::postgres(&pool);
    let user = find_user(&repos, login).await?;

    let expires_at = ttl_hours.map(|hours| Utc::now() + Duration::hours(i64::from(hours)));
    let issued = TokenIssuer::new(&repos)
        .issue(&user, name, abilities, expires_at)
        .await?;

    tracing::info!(
        "Token created! ID: {}, User: {}, Abilities: {}",
        issued.token.id,
        user.username,
        issued.token.abilities.as_slice().join(",")
    );
    #[allow(clippy::print_stdout)]
    {
        println!("{}", issued.plaintext.expose_secret());
    }

    pool.close().await;
    Ok(())
}

/// Delete tokens that expired at least `hours` ago.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable.
pub async fn prune(hours: u32) -> Result<(), CommandError> {
    let pool = connect().await?;
    let repos = Repositories::postgres(&pool);

    let pruned = TokenIssuer::new(&repos)
        .prune_expired(Duration::hours(i64::from(hours)))
        .await?;
    tracing::info!("Deleted {} expired token(s)", pruned);

    pool.close().await;
    Ok(())
}

/// Known abilities only; none given means the wildcard.
fn parse_abilities(abilities: Vec<String>) -> Result<Abilities, CommandError> {
    if abilities.is_empty() {
        return Ok(Abilities::all());
    }
    if let Some(unknown) = abilities.iter().find(|a| {
        a.as_str() != Abilities::WILDCARD && !Abilities::KNOWN.contains(&a.as_str())
    }) {
        return Err(CommandError::Invalid(format!(
            "unknown ability {unknown}; expected one of: *, {}",
            Abilities::KNOWN.join(", ")
        )));
    }
    Ok(Abilities::new(abilities))
}
