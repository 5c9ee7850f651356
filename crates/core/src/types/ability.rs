//! Token ability scopes.

use serde::{Deserialize, Serialize};

/// The set of actions a personal access token may authorize.
///
/// The wildcard `*` grants every ability; tokens issued at login carry it.
/// Integration tokens are usually scoped to a few named abilities such as
/// `products:read`.
///
/// ```
/// use stockroom_core::Abilities;
///
/// assert!(Abilities::all().can(Abilities::PRODUCTS_WRITE));
///
/// let scoped = Abilities::new([Abilities::PRODUCTS_READ]);
/// assert!(scoped.can(Abilities::PRODUCTS_READ));
/// assert!(!scoped.can(Abilities::PRODUCTS_WRITE));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Abilities(Vec<String>);

impl Abilities {
    /// Wildcard ability.
    pub const WILDCARD: &'static str = "*";
    /// List and show products.
    pub const PRODUCTS_READ: &'static str = "products:read";
    /// Create, update and delete products.
    pub const PRODUCTS_WRITE: &'static str = "products:write";
    /// List and show users.
    pub const USERS_READ: &'static str = "users:read";
    /// Update and delete users.
    pub const USERS_WRITE: &'static str = "users:write";

    /// Every ability this application checks.
    pub const KNOWN: [&'static str; 4] = [
        Self::PRODUCTS_READ,
        Self::PRODUCTS_WRITE,
        Self::USERS_READ,
        Self::USERS_WRITE,
    ];

    /// Create a scope from a list of ability names.
    ///
    /// Duplicates and blank names are dropped. An empty list yields an empty
    /// scope, which authorizes nothing.
    pub fn new<I, S>(abilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for ability in abilities {
            let ability = ability.into().trim().to_owned();
            if !ability.is_empty() && !list.contains(&ability) {
                list.push(ability);
            }
        }
        Self(list)
    }

    /// The wildcard scope.
    #[must_use]
    pub fn all() -> Self {
        Self(vec![Self::WILDCARD.to_owned()])
    }

    /// Whether this scope authorizes `ability`.
    #[must_use]
    pub fn can(&self, ability: &str) -> bool {
        self.0.iter().any(|a| a == Self::WILDCARD || a == ability)
    }

    /// Ability names in this scope.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Consume the scope, returning the ability names.
    #[must_use]
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Default for Abilities {
    fn default() -> Self {
        Self::all()
    }
}

impl From<Vec<String>> for Abilities {
    fn from(abilities: Vec<String>) -> Self {
        Self::new(abilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_wildcard() {
        let abilities = Abilities::default();
        assert_eq!(abilities.as_slice(), ["*"]);
        for ability in Abilities::KNOWN {
            assert!(abilities.can(ability));
        }
    }

    #[test]
    fn test_new_deduplicates_and_trims() {
        let abilities = Abilities::new(["users:read", " users:read ", "", "products:read"]);
        assert_eq!(abilities.as_slice(), ["users:read", "products:read"]);
    }

    #[test]
    fn test_empty_scope_authorizes_nothing() {
        let abilities = Abilities::new(Vec::<String>::new());
        assert!(!abilities.can(Abilities::USERS_READ));
    }
}
