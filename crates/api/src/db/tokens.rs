//! Personal access token store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use stockroom_core::{Abilities, TokenId, UserId};

use super::{RepositoryError, map_unique_violation};
use crate::models::{AccessToken, NewAccessToken};

/// Persistence port for bearer tokens.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn create(&self, token: NewAccessToken) -> Result<AccessToken, RepositoryError>;

    /// Look a token up by the digest of its secret.
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<AccessToken>, RepositoryError>;

    /// Record a successful use.
    async fn touch(&self, id: TokenId, at: DateTime<Utc>) -> Result<(), RepositoryError>;

    /// Returns `false` if no row matched.
    async fn delete(&self, id: TokenId) -> Result<bool, RepositoryError>;

    /// Delete tokens that expired before `cutoff`. Returns the number removed.
    async fn prune_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError>;
}

const TOKEN_COLUMNS: &str =
    "id, user_id, name, abilities, last_used_at, expires_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: i32,
    user_id: i32,
    name: String,
    abilities: Vec<String>,
    last_used_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TokenRow> for AccessToken {
    fn from(row: TokenRow) -> Self {
        Self {
            id: TokenId::new(row.id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            abilities: Abilities::from(row.abilities),
            last_used_at: row.last_used_at,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `PostgreSQL` token store.
#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    /// Create a new token store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn create(&self, token: NewAccessToken) -> Result<AccessToken, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO personal_access_tokens (user_id, name, token, abilities, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TOKEN_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(token.user_id.as_i32())
            .bind(&token.name)
            .bind(&token.token_hash)
            .bind(token.abilities.as_slice())
            .bind(token.expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, &["token"]))?;

        Ok(row.into())
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<AccessToken>, RepositoryError> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM personal_access_tokens WHERE token = $1");
        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AccessToken::from))
    }

    async fn touch(&self, id: TokenId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE personal_access_tokens SET last_used_at = $2 WHERE id = $1")
            .bind(id.as_i32())
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: TokenId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM personal_access_tokens WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn prune_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM personal_access_tokens WHERE expires_at IS NOT NULL AND expires_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
