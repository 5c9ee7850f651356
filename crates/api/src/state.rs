//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::Repositories;
use crate::services::auth::AuthService;
use crate::services::products::ProductService;
use crate::services::tokens::TokenIssuer;
use crate::services::users::UserService;
use crate::storage::FileStorage;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration, the stores, and file storage.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    repos: Repositories,
    storage: Arc<dyn FileStorage>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ApiConfig, repos: Repositories, storage: Arc<dyn FileStorage>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                repos,
                storage,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the stores.
    #[must_use]
    pub fn repos(&self) -> &Repositories {
        &self.inner.repos
    }

    /// Get a reference to public file storage.
    #[must_use]
    pub fn storage(&self) -> &dyn FileStorage {
        self.inner.storage.as_ref()
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.repos(), self.config().token_ttl)
    }

    #[must_use]
    pub fn tokens(&self) -> TokenIssuer<'_> {
        TokenIssuer::new(self.repos())
    }

    #[must_use]
    pub fn users(&self) -> UserService<'_> {
        UserService::new(self.repos())
    }

    #[must_use]
    pub fn products(&self) -> ProductService<'_> {
        ProductService::new(
            self.repos(),
            self.storage(),
            self.config().max_upload_bytes,
        )
    }
}
