//! User registration and account management.
//!
//! Input arrives as a loose JSON object so that every broken rule can be
//! reported at once. Nothing is written until the whole request validates,
//! and updates are persisted in a single statement.

use std::future::Future;

use serde_json::{Map, Value};
use thiserror::Error;

use stockroom_core::slug::{candidates, user_slug};
use stockroom_core::{Email, PageRequest, UserId, validate_password_strength};

use super::authorization::{Decision, UserAction, authorize_user_action};
use crate::db::{Repositories, RepositoryError, UserStore};
use crate::models::{HashedPassword, NewUser, PasswordError, User, UserFlags};
use crate::validation::{Field, ValidationErrors, Validator};

const NAME_MAX: usize = 255;

/// Slug clashes tolerated from concurrent writers before giving up.
const SLUG_RETRIES: usize = 5;

/// Errors from user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("validation failed: {}", .0.summary())]
    Validation(ValidationErrors),

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("user not found")]
    NotFound,

    /// Repository/database error, including unique-constraint conflicts.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("password hashing error")]
    PasswordHash,
}

impl From<ValidationErrors> for UserError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<PasswordError> for UserError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Policy(policy) => {
                let mut errors = ValidationErrors::new();
                for message in policy.messages() {
                    errors.add("password", message);
                }
                Self::Validation(errors)
            }
            PasswordError::UnrecognizedHash | PasswordError::Hash => Self::PasswordHash,
        }
    }
}

/// Which identifiers may address a user in a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKey {
    /// Numeric id, username, or slug.
    IdUsernameOrSlug,
    /// Numeric id or slug.
    IdOrSlug,
}

/// Unique-field messages differ between registration and updates.
#[derive(Clone, Copy)]
enum Uniqueness {
    Register,
    Update(UserId),
}

impl Uniqueness {
    const fn except(self) -> Option<UserId> {
        match self {
            Self::Register => None,
            Self::Update(id) => Some(id),
        }
    }

    fn message(self, field: &str) -> String {
        let base = match field {
            "email" => "The email address is already in use",
            "username" => "The username is already taken",
            _ => "The value has already been taken",
        };
        match self {
            Self::Register => format!("{base}."),
            Self::Update(_) => format!("{base} by another user."),
        }
    }
}

/// User service.
pub struct UserService<'a> {
    users: &'a dyn UserStore,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub fn new(repos: &'a Repositories) -> Self {
        Self {
            users: repos.users.as_ref(),
        }
    }

    /// Register a new active, non-staff user.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Validation` listing every broken rule, or
    /// `UserError::Repository` with a `Conflict` if a concurrent insert won
    /// the email or username constraint. Lost slug races move on to the
    /// next numbered slug.
    pub async fn register(&self, input: &Map<String, Value>) -> Result<User, UserError> {
        let mut v = Validator::new(input);
        let first_name = v.string("first_name", false, NAME_MAX).into_option();
        let last_name = v.string("last_name", false, NAME_MAX).into_option();
        let email = v.email("email", true);
        let username = v.string("username", true, NAME_MAX);
        let password = v.secret("password", true);

        self.check_unique(&mut v, &email, &username, Uniqueness::Register)
            .await?;
        check_password(&mut v, &password);
        v.finish()?;

        let (Field::Set(email), Field::Set(username), Field::Set(password)) =
            (email, username, password)
        else {
            return Err(ValidationErrors::single("email", "The given data was invalid.").into());
        };

        let new = NewUser {
            first_name,
            last_name,
            email,
            username,
            slug: String::new(),
            password: HashedPassword::from_plaintext(&password)?,
            flags: UserFlags::default(),
        };
        let users = self.users;
        let email = new.email.clone();
        let user = self
            .with_free_slug(&email, None, move |slug| {
                let mut new = new.clone();
                new.slug = slug;
                users.create(new)
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// One page of users and the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn list(&self, page: PageRequest) -> Result<(Vec<User>, u64), RepositoryError> {
        let users = self.users.list(page).await?;
        let total = self.users.count().await?;
        Ok((users, total))
    }

    /// Find a user by a route segment.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` if nothing matches.
    pub async fn resolve(&self, key: &str, by: UserKey) -> Result<User, UserError> {
        if let Ok(id) = key.parse::<UserId>()
            && let Some(user) = self.users.find_by_id(id).await?
        {
            return Ok(user);
        }
        if by == UserKey::IdUsernameOrSlug
            && let Some(user) = self.users.find_by_username(key).await?
        {
            return Ok(user);
        }
        self.users
            .find_by_slug(key)
            .await?
            .ok_or(UserError::NotFound)
    }

    /// Update the user addressed by `key` on behalf of `actor`.
    ///
    /// Authorization runs before validation; a non-staff actor who sends
    /// `is_staff` at all is refused. `first_name` and `last_name` may be
    /// cleared with `null`; a `null` for any other field leaves it alone.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound`, `UserError::Forbidden`, or
    /// `UserError::Validation`. Nothing is written on error.
    pub async fn update(
        &self,
        actor: &User,
        key: &str,
        input: &Map<String, Value>,
    ) -> Result<User, UserError> {
        let target = self.resolve(key, UserKey::IdOrSlug).await?;

        authorize(actor, &target, UserAction::Update)?;
        if input.contains_key("is_staff") {
            authorize(actor, &target, UserAction::ChangeStaffStatus)?;
        }

        let mut v = Validator::new(input);
        let first_name = v.string("first_name", false, NAME_MAX).into_patch();
        let last_name = v.string("last_name", false, NAME_MAX).into_patch();
        let email = v.email("email", false);
        let username = v.string("username", false, NAME_MAX);
        let password = v.secret("password", false);
        let is_active = v.boolean("is_active").into_option();
        let is_staff = v.boolean("is_staff").into_option();

        let uniqueness = Uniqueness::Update(target.id);
        self.check_unique(&mut v, &email, &username, uniqueness)
            .await?;
        check_password(&mut v, &password);
        v.finish()?;

        let mut updated = target.clone();
        if let Some(first_name) = first_name {
            updated.first_name = first_name;
        }
        if let Some(last_name) = last_name {
            updated.last_name = last_name;
        }
        let email_changed = matches!(&email, Field::Set(email) if *email != updated.email);
        if let Field::Set(email) = email {
            updated.email = email;
        }
        if let Field::Set(username) = username {
            updated.username = username;
        }
        if let Field::Set(password) = password {
            updated.set_password(&password)?;
        }
        if let Some(is_active) = is_active {
            updated.is_active = is_active;
        }
        if let Some(is_staff) = is_staff {
            updated.is_staff = is_staff;
        }

        let written = if email_changed {
            let users = self.users;
            let email = updated.email.clone();
            self.with_free_slug(&email, Some(target.id), move |slug| {
                let mut user = updated.clone();
                user.slug = slug;
                async move { users.update(&user).await }
            })
            .await
        } else {
            self.users.update(&updated).await
        };
        let saved = written.map_err(|e| {
            match e.conflict_field() {
                Some(field) => {
                    UserError::Validation(ValidationErrors::single(field, uniqueness.message(field)))
                }
                None => e.into(),
            }
        })?;

        tracing::info!(actor_id = %actor.id, user_id = %saved.id, "User updated");
        Ok(saved)
    }

    /// Delete the user addressed by `key` on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` or `UserError::Forbidden`.
    pub async fn delete(&self, actor: &User, key: &str) -> Result<(), UserError> {
        let target = self.resolve(key, UserKey::IdOrSlug).await?;
        authorize(actor, &target, UserAction::Delete)?;

        if !self.users.delete(target.id).await? {
            return Err(UserError::NotFound);
        }

        tracing::info!(actor_id = %actor.id, user_id = %target.id, "User deleted");
        Ok(())
    }

    async fn check_unique(
        &self,
        v: &mut Validator<'_>,
        email: &Field<Email>,
        username: &Field<String>,
        uniqueness: Uniqueness,
    ) -> Result<(), RepositoryError> {
        if let Field::Set(email) = email
            && self.users.email_taken(email, uniqueness.except()).await?
        {
            v.add("email", uniqueness.message("email"));
        }
        if let Field::Set(username) = username
            && self
                .users
                .username_taken(username, uniqueness.except())
                .await?
        {
            v.add("username", uniqueness.message("username"));
        }
        Ok(())
    }

    /// Run `write` with the first slug for `email` that looks free, moving
    /// to the next candidate when the write still hits the slug constraint.
    async fn with_free_slug<F, Fut>(
        &self,
        email: &Email,
        except: Option<UserId>,
        mut write: F,
    ) -> Result<User, RepositoryError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<User, RepositoryError>>,
    {
        let base = user_slug(email.as_str());
        let mut clashes = 0;
        for candidate in candidates(&base) {
            if self.users.slug_taken(&candidate, except).await? {
                continue;
            }
            match write(candidate).await {
                Err(e) if e.conflict_field() == Some("slug") && clashes < SLUG_RETRIES => {
                    clashes += 1;
                    tracing::debug!(clashes, "Slug taken by a concurrent write, retrying");
                }
                result => return result,
            }
        }
        Err(RepositoryError::conflict("slug"))
    }
}

fn authorize(actor: &User, target: &User, action: UserAction) -> Result<(), UserError> {
    match authorize_user_action(actor, target, action) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            tracing::warn!(
                actor_id = %actor.id,
                target_id = %target.id,
                ?action,
                "Forbidden user mutation"
            );
            Err(UserError::Forbidden(reason))
        }
    }
}

/// Confirmation first, then every strength rule the password breaks.
fn check_password(v: &mut Validator<'_>, password: &Field<String>) {
    let Field::Set(password) = password else {
        return;
    };
    let input = v.input();
    let confirmed = matches!(
        input.get("password_confirmation"),
        Some(Value::String(confirmation)) if confirmation == password
    );
    if !confirmed {
        v.add("password", "The password confirmation does not match.");
    }
    if let Err(policy) = validate_password_strength(password) {
        for message in policy.messages() {
            v.add("password", message);
        }
    }
}
