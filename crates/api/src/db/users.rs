//! User store for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use stockroom_core::{Email, PageRequest, UserId};

use super::{RepositoryError, count_to_u64, map_unique_violation};
use crate::models::{HashedPassword, NewUser, User, UserFlags};

/// Persistence port for users.
///
/// Email, username and slug are unique; writes that would break that fail
/// with `RepositoryError::Conflict` naming the field.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<User>, RepositoryError>;

    /// Write every field of `user` in one statement.
    ///
    /// Returns `RepositoryError::NotFound` if the row no longer exists.
    async fn update(&self, user: &User) -> Result<User, RepositoryError>;

    /// Delete a user (and, through the foreign key, their tokens).
    /// Returns `false` if no row matched.
    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError>;

    /// One page of users ordered by id.
    async fn list(&self, page: PageRequest) -> Result<Vec<User>, RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;

    /// Whether another user (not `except`) holds `email`.
    async fn email_taken(
        &self,
        email: &Email,
        except: Option<UserId>,
    ) -> Result<bool, RepositoryError>;

    /// Whether another user (not `except`) holds `username`.
    async fn username_taken(
        &self,
        username: &str,
        except: Option<UserId>,
    ) -> Result<bool, RepositoryError>;

    /// Whether another user (not `except`) holds `slug`.
    async fn slug_taken(&self, slug: &str, except: Option<UserId>)
    -> Result<bool, RepositoryError>;
}

const UNIQUE_FIELDS: &[&str] = &["email", "username", "slug"];

const USER_COLUMNS: &str = "id, first_name, last_name, email, username, slug, password, \
                            is_active, is_staff, email_verified_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    first_name: Option<String>,
    last_name: Option<String>,
    email: String,
    username: String,
    slug: String,
    password: String,
    is_active: bool,
    is_staff: bool,
    email_verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let password = HashedPassword::from_hash(row.password).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid password hash in database: {e}"))
        })?;

        Ok(Self::from_parts(
            UserId::new(row.id),
            row.first_name,
            row.last_name,
            email,
            row.username,
            row.slug,
            password,
            UserFlags {
                is_active: row.is_active,
                is_staff: row.is_staff,
            },
            row.email_verified_at,
            row.created_at,
            row.updated_at,
        ))
    }
}

/// `PostgreSQL` user store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new user store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_where(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn taken(
        &self,
        column: &str,
        value: &str,
        except: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM users WHERE {column} = $1 AND ($2::INTEGER IS NULL OR id <> $2))"
        );
        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(value)
            .bind(except.map(|id| id.as_i32()))
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO users (first_name, last_name, email, username, slug, password, is_active, is_staff)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.email.as_str())
            .bind(&user.username)
            .bind(&user.slug)
            .bind(user.password.as_str())
            .bind(user.flags.is_active)
            .bind(user.flags.is_staff)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, UNIQUE_FIELDS))?;

        User::try_from(row)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        self.find_where("email", email.as_str()).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        self.find_where("username", username).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<User>, RepositoryError> {
        self.find_where("slug", slug).await
    }

    async fn update(&self, user: &User) -> Result<User, RepositoryError> {
        let sql = format!(
            r"
            UPDATE users
            SET first_name = $2, last_name = $3, email = $4, username = $5, slug = $6,
                password = $7, is_active = $8, is_staff = $9, email_verified_at = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id.as_i32())
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.email.as_str())
            .bind(&user.username)
            .bind(&user.slug)
            .bind(user.password().as_str())
            .bind(user.is_active)
            .bind(user.is_staff)
            .bind(user.email_verified_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, UNIQUE_FIELDS))?
            .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        count_to_u64(count)
    }

    async fn email_taken(
        &self,
        email: &Email,
        except: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        self.taken("email", email.as_str(), except).await
    }

    async fn username_taken(
        &self,
        username: &str,
        except: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        self.taken("username", username, except).await
    }

    async fn slug_taken(
        &self,
        slug: &str,
        except: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        self.taken("slug", slug, except).await
    }
}
