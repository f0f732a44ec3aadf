//! Shared application state.

use std::sync::Arc;

use crate::api::ShopClient;
use crate::config::StorefrontConfig;

/// Application state shared across all request handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    shop: ShopClient,
}

impl AppState {
    /// Create application state from configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let shop = ShopClient::new(&config);
        Self {
            inner: Arc::new(AppStateInner { config, shop }),
        }
    }

    /// The storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The sweet shop API client.
    #[must_use]
    pub fn shop(&self) -> &ShopClient {
        &self.inner.shop
    }
}
