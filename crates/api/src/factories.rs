//! Builders for fake users and products.
//!
//! Used by `stockroom seed` and throughout the tests. Every field has a
//! random default that can be overridden.

use std::sync::OnceLock;

use chrono::Utc;
use rand::Rng;
use rand::seq::IndexedRandom;
use rust_decimal::Decimal;
use thiserror::Error;

use stockroom_core::slug::user_slug;
use stockroom_core::{Email, EmailError, Price, PriceError, UserId};

use crate::models::{HashedPassword, NewProduct, NewUser, PasswordError, User, UserFlags};

/// Password given to factory users unless overridden.
pub const DEFAULT_PASSWORD: &str = "Password1!";

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Dennis", "Edsger", "Frances", "Grace", "Ken", "Linus", "Margaret",
];
const LAST_NAMES: &[&str] = &[
    "Hopper", "Knuth", "Liskov", "Lovelace", "Ritchie", "Thompson", "Turing", "Wirth",
];
const WORDS: &[&str] = &[
    "amber", "brisk", "cobalt", "delta", "ember", "fable", "granite", "harbor", "ivory", "juniper",
    "kestrel", "lumen", "marble", "nimbus", "onyx", "prairie", "quartz", "russet", "summit",
    "tundra",
];

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Price(#[from] PriceError),
}

fn pick(words: &[&'static str]) -> &'static str {
    words.choose(&mut rand::rng()).copied().unwrap_or_default()
}

fn default_hash() -> Result<HashedPassword, PasswordError> {
    static HASH: OnceLock<HashedPassword> = OnceLock::new();
    if let Some(hash) = HASH.get() {
        return Ok(hash.clone());
    }
    let hash = HashedPassword::from_plaintext(DEFAULT_PASSWORD)?;
    Ok(HASH.get_or_init(|| hash).clone())
}

/// Builds users.
#[derive(Debug, Clone, Default)]
pub struct UserFactory {
    id: Option<i32>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    username: Option<String>,
    password: Option<String>,
    flags: UserFlags,
}

impl UserFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    /// Plaintext password; it must satisfy the strength policy.
    #[must_use]
    pub fn password(mut self, plaintext: impl Into<String>) -> Self {
        self.password = Some(plaintext.into());
        self
    }

    #[must_use]
    pub const fn staff(mut self) -> Self {
        self.flags.is_staff = true;
        self
    }

    #[must_use]
    pub const fn inactive(mut self) -> Self {
        self.flags.is_active = false;
        self
    }

    /// A user ready to insert.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if an overridden email or password is invalid.
    pub fn new_user(self) -> Result<NewUser, FactoryError> {
        let mut rng = rand::rng();
        let first_name = self
            .first_name
            .unwrap_or_else(|| pick(FIRST_NAMES).to_owned());
        let last_name = self
            .last_name
            .unwrap_or_else(|| pick(LAST_NAMES).to_owned());
        let tag: u64 = rng.random();
        let username = self
            .username
            .unwrap_or_else(|| format!("{}{tag:016x}", first_name.to_lowercase()));
        let email = Email::parse(
            &self
                .email
                .unwrap_or_else(|| format!("{username}@example.com")),
        )?;
        let password = match self.password {
            Some(plaintext) => HashedPassword::from_plaintext(&plaintext)?,
            None => default_hash()?,
        };

        Ok(NewUser {
            first_name: Some(first_name),
            last_name: Some(last_name),
            slug: user_slug(email.as_str()),
            email,
            username,
            password,
            flags: self.flags,
        })
    }

    /// A user as if loaded from storage, with id 1 unless overridden.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if an overridden email or password is invalid.
    pub fn build(self) -> Result<User, FactoryError> {
        let id = UserId::new(self.id.unwrap_or(1));
        let new = self.new_user()?;
        let now = Utc::now();
        Ok(User::from_parts(
            id,
            new.first_name,
            new.last_name,
            new.email,
            new.username,
            new.slug,
            new.password,
            new.flags,
            None,
            now,
            now,
        ))
    }
}

/// Builds products.
#[derive(Debug, Clone, Default)]
pub struct ProductFactory {
    name: Option<String>,
    price: Option<Price>,
    stock: Option<i32>,
    image: Option<String>,
}

impl ProductFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub const fn stock(mut self, stock: i32) -> Self {
        self.stock = Some(stock);
        self
    }

    /// Public URL of an already stored image.
    #[must_use]
    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    /// A product ready to insert, priced between 10 and 1000.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError::Price` if the generated price is out of range.
    pub fn build(self) -> Result<NewProduct, FactoryError> {
        let mut rng = rand::rng();
        let name = self.name.unwrap_or_else(|| {
            format!("{} {} Product", capitalize(pick(WORDS)), pick(WORDS))
        });
        let price = match self.price {
            Some(price) => price,
            None => Price::new(Decimal::new(rng.random_range(1_000..=100_000), Price::SCALE))?,
        };
        let description = (0..3)
            .map(|_| {
                format!(
                    "{} {} {} {}.",
                    capitalize(pick(WORDS)),
                    pick(WORDS),
                    pick(WORDS),
                    pick(WORDS)
                )
            })
            .collect::<Vec<_>>()
            .join(" ");

        Ok(NewProduct {
            name,
            description: Some(description),
            price,
            stock: self.stock.unwrap_or_else(|| rng.random_range(0..=200)),
            image: self.image,
        })
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_defaults() {
        let user = UserFactory::new().new_user().unwrap();
        assert!(user.flags.is_active);
        assert!(!user.flags.is_staff);
        assert!(user.email.as_str().ends_with("@example.com"));
        assert_eq!(user.slug, user_slug(user.email.as_str()));
        assert!(user.password.verify(DEFAULT_PASSWORD));
    }

    #[test]
    fn test_user_overrides() {
        let user = UserFactory::new()
            .id(7)
            .email("admin@example.com")
            .username("admin")
            .staff()
            .inactive()
            .build()
            .unwrap();
        assert_eq!(user.id, UserId::new(7));
        assert_eq!(user.username, "admin");
        assert_eq!(user.slug, "admin-at-examplecom");
        assert!(user.is_staff);
        assert!(!user.is_active);
    }

    #[test]
    fn test_generated_usernames_do_not_repeat() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2_000 {
            let user = UserFactory::new().new_user().unwrap();
            assert!(seen.insert(user.username), "username repeated");
        }
    }

    #[test]
    fn test_weak_password_override_is_rejected() {
        assert!(matches!(
            UserFactory::new().password("weak").new_user(),
            Err(FactoryError::Password(_))
        ));
    }

    #[test]
    fn test_products_are_in_range() {
        for _ in 0..20 {
            let product = ProductFactory::new().build().unwrap();
            assert!(product.price.amount() >= Decimal::new(10, 0));
            assert!(product.price.amount() <= Decimal::new(1000, 0));
            assert!((0..=200).contains(&product.stock));
            assert!(product.name.ends_with(" Product"));
            assert!(product.image.is_none());
        }
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("amber"), "Amber");
        assert_eq!(capitalize(""), "");
    }
}
