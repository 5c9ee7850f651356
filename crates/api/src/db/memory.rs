//! In-memory stores for router and service tests.
//!
//! They enforce the same uniqueness rules as the database schema.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockroom_core::{Email, PageRequest, ProductId, TokenId, UserId};

use super::{ProductStore, Repositories, RepositoryError, TokenStore, UserStore};
use crate::models::{AccessToken, NewAccessToken, NewProduct, NewUser, Product, User};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn page_of<T: Clone>(items: impl Iterator<Item = T>, page: PageRequest) -> Vec<T> {
    let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let take = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    items.skip(skip).take(take).collect()
}

impl Repositories {
    /// Empty in-memory stores.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            users: Arc::new(MemoryUserStore::default()),
            tokens: Arc::new(MemoryTokenStore::default()),
            products: Arc::new(MemoryProductStore::default()),
        }
    }
}

struct Table<T> {
    last_id: i32,
    rows: BTreeMap<i32, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            last_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Default)]
pub struct MemoryUserStore {
    table: Mutex<Table<User>>,
}

fn check_unique(
    rows: &BTreeMap<i32, User>,
    email: &Email,
    username: &str,
    slug: &str,
    except: Option<i32>,
) -> Result<(), RepositoryError> {
    for (id, user) in rows {
        if Some(*id) == except {
            continue;
        }
        if &user.email == email {
            return Err(RepositoryError::conflict("email"));
        }
        if user.username == username {
            return Err(RepositoryError::conflict("username"));
        }
        if user.slug == slug {
            return Err(RepositoryError::conflict("slug"));
        }
    }
    Ok(())
}

impl MemoryUserStore {
    fn find_with(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        lock(&self.table).rows.values().find(|u| pred(u)).cloned()
    }

    fn taken_with(&self, except: Option<UserId>, pred: impl Fn(&User) -> bool) -> bool {
        lock(&self.table)
            .rows
            .values()
            .any(|u| Some(u.id) != except && pred(u))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut table = lock(&self.table);
        check_unique(&table.rows, &user.email, &user.username, &user.slug, None)?;
        let id = table.next_id();
        let now = Utc::now();
        let created = User::from_parts(
            UserId::new(id),
            user.first_name,
            user.last_name,
            user.email,
            user.username,
            user.slug,
            user.password,
            user.flags,
            None,
            now,
            now,
        );
        table.rows.insert(id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.table).rows.get(&id.as_i32()).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self.find_with(|u| &u.email == email))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.find_with(|u| u.username == username))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.find_with(|u| u.slug == slug))
    }

    async fn update(&self, user: &User) -> Result<User, RepositoryError> {
        let mut table = lock(&self.table);
        let id = user.id.as_i32();
        if !table.rows.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        check_unique(&table.rows, &user.email, &user.username, &user.slug, Some(id))?;
        let mut updated = user.clone();
        updated.updated_at = Utc::now();
        table.rows.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.table).rows.remove(&id.as_i32()).is_some())
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<User>, RepositoryError> {
        let table = lock(&self.table);
        Ok(page_of(table.rows.values().cloned(), page))
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(lock(&self.table).rows.len() as u64)
    }

    async fn email_taken(
        &self,
        email: &Email,
        except: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        Ok(self.taken_with(except, |u| &u.email == email))
    }

    async fn username_taken(
        &self,
        username: &str,
        except: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        Ok(self.taken_with(except, |u| u.username == username))
    }

    async fn slug_taken(
        &self,
        slug: &str,
        except: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        Ok(self.taken_with(except, |u| u.slug == slug))
    }
}

// =============================================================================
// Tokens
// =============================================================================

#[derive(Default)]
pub struct MemoryTokenStore {
    table: Mutex<Table<(String, AccessToken)>>,
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn create(&self, token: NewAccessToken) -> Result<AccessToken, RepositoryError> {
        let mut table = lock(&self.table);
        if table.rows.values().any(|(hash, _)| *hash == token.token_hash) {
            return Err(RepositoryError::conflict("token"));
        }
        let id = table.next_id();
        let now = Utc::now();
        let created = AccessToken {
            id: TokenId::new(id),
            user_id: token.user_id,
            name: token.name,
            abilities: token.abilities,
            last_used_at: None,
            expires_at: token.expires_at,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, (token.token_hash, created.clone()));
        Ok(created)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<AccessToken>, RepositoryError> {
        Ok(lock(&self.table)
            .rows
            .values()
            .find(|(hash, _)| hash == token_hash)
            .map(|(_, token)| token.clone()))
    }

    async fn touch(&self, id: TokenId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        if let Some((_, token)) = lock(&self.table).rows.get_mut(&id.as_i32()) {
            token.last_used_at = Some(at);
        }
        Ok(())
    }

    async fn delete(&self, id: TokenId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.table).rows.remove(&id.as_i32()).is_some())
    }

    async fn prune_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut table = lock(&self.table);
        let before = table.rows.len();
        table
            .rows
            .retain(|_, (_, token)| token.expires_at.is_none_or(|at| at >= cutoff));
        Ok((before - table.rows.len()) as u64)
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Default)]
pub struct MemoryProductStore {
    table: Mutex<Table<Product>>,
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut table = lock(&self.table);
        let id = table.next_id();
        let now = Utc::now();
        let created = Product {
            id: ProductId::new(id),
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            image: product.image,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, created.clone());
        Ok(created)
    }

    async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(lock(&self.table).rows.get(&id.as_i32()).cloned())
    }

    async fn update(&self, product: &Product) -> Result<Product, RepositoryError> {
        let mut table = lock(&self.table);
        let row = table
            .rows
            .get_mut(&product.id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        *row = product.clone();
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.table).rows.remove(&id.as_i32()).is_some())
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<Product>, RepositoryError> {
        let table = lock(&self.table);
        let mut rows: Vec<Product> = table.rows.values().cloned().collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i32().cmp(&a.id.as_i32()))
        });
        Ok(page_of(rows.into_iter(), page))
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(lock(&self.table).rows.len() as u64)
    }
}
