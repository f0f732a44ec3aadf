//! Sweet shop API client implementation.
//!
//! Uses `reqwest` for HTTP and `moka` to cache the catalog snapshot. The
//! cached snapshot is what the cart's stock guards are checked against; it is
//! invalidated after a successful checkout and after admin product mutations
//! so the next render refetches the server's post-mutation state.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use sweet_shop_core::{OrderId, OrderStatus, SweetId, UserId};

use super::ApiError;
use super::types::{
    Account, AdminFlagUpdate, Order, OrderRequest, OrderStatusUpdate, RegisterRequest, Sweet,
    SweetInput, TokenResponse, UserProfile,
};
use crate::config::StorefrontConfig;

/// Cache key for the catalog snapshot (the cache holds a single entry).
const CATALOG_KEY: &str = "catalog";

/// Client for the sweet shop REST API.
///
/// Cheaply cloneable via `Arc`; one instance is shared by all handlers.
#[derive(Clone)]
pub struct ShopClient {
    inner: Arc<ShopClientInner>,
}

struct ShopClientInner {
    http: reqwest::Client,
    base_url: url::Url,
    catalog: Cache<String, Arc<Vec<Sweet>>>,
}

impl ShopClient {
    /// Create a new API client from configuration.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        let catalog = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Self {
            inner: Arc::new(ShopClientInner {
                http: reqwest::Client::new(),
                base_url: config.api_url.clone(),
                catalog,
            }),
        }
    }

    /// Absolute URL for an API endpoint path.
    fn endpoint(&self, path: &str) -> String {
        // base_url is normalized with a trailing slash in config loading
        format!("{}{path}", self.inner.base_url)
    }

    /// Attach a bearer token if one is present.
    ///
    /// The header is never sent empty or stale: callers without a session
    /// simply pass `None`.
    fn with_bearer(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => request,
        }
    }

    /// Send a request and check the response status.
    ///
    /// Non-success statuses are converted into [`ApiError`] with the server's
    /// `detail` message extracted.
    async fn send(request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_response(status, &body))
    }

    /// Send a request and parse the JSON response body.
    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::send(request).await?;

        // Read the body as text first for better diagnostics on schema drift
        let text = response.text().await?;
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %text.chars().take(500).collect::<String>(),
                    "Failed to parse API response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let request = Self::with_bearer(self.inner.http.get(self.endpoint(path)), token);
        Self::send_json(request).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<T, ApiError> {
        let request =
            Self::with_bearer(self.inner.http.post(self.endpoint(path)), token).json(body);
        Self::send_json(request).await
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange credentials for an access token.
    ///
    /// The token endpoint is OAuth2-form-shaped: the email is sent as
    /// `username`, form-encoded rather than JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let request = self
            .inner
            .http
            .post(self.endpoint("auth/token"))
            .form(&[("username", email), ("password", password)]);
        Self::send_json(request).await
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is taken or validation fails; structured
    /// validation errors are flattened into the error's message.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        self.post_json("auth/register", None, &RegisterRequest { email, password })
            .await
    }

    /// Resolve the identity behind a token.
    ///
    /// # Errors
    ///
    /// Returns an unauthorized error if the token is expired or invalid.
    #[instrument(skip(self, token))]
    pub async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.get("users/me", Some(token)).await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Get the catalog snapshot, fetching from the API on cache miss.
    ///
    /// All stock-limit checks in the cart run against this snapshot; the
    /// server re-validates at order time.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn catalog(&self) -> Result<Arc<Vec<Sweet>>, ApiError> {
        if let Some(sweets) = self.inner.catalog.get(CATALOG_KEY).await {
            debug!("Cache hit for catalog");
            return Ok(sweets);
        }

        let sweets: Vec<Sweet> = self.get("sweets/", None).await?;
        let sweets = Arc::new(sweets);
        self.inner
            .catalog
            .insert(CATALOG_KEY.to_string(), Arc::clone(&sweets))
            .await;
        Ok(sweets)
    }

    /// Drop the cached catalog snapshot so the next read refetches.
    pub async fn invalidate_catalog(&self) {
        self.inner.catalog.invalidate(CATALOG_KEY).await;
    }

    /// Fetch a single sweet by ID (uncached).
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the sweet does not exist.
    #[instrument(skip(self))]
    pub async fn sweet(&self, id: SweetId) -> Result<Sweet, ApiError> {
        self.get(&format!("sweets/{id}"), None).await
    }

    // =========================================================================
    // Catalog mutations (admin)
    // =========================================================================

    /// Create a sweet.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the name is taken.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_sweet(&self, token: &str, input: &SweetInput) -> Result<Sweet, ApiError> {
        let sweet = self.post_json("sweets/", Some(token), input).await?;
        self.invalidate_catalog().await;
        Ok(sweet)
    }

    /// Update a sweet.
    ///
    /// # Errors
    ///
    /// Returns an error if the sweet does not exist or the caller is not admin.
    #[instrument(skip(self, token, input))]
    pub async fn update_sweet(
        &self,
        token: &str,
        id: SweetId,
        input: &SweetInput,
    ) -> Result<Sweet, ApiError> {
        let request = Self::with_bearer(
            self.inner.http.put(self.endpoint(&format!("sweets/{id}"))),
            Some(token),
        )
        .json(input);
        let sweet = Self::send_json(request).await?;
        self.invalidate_catalog().await;
        Ok(sweet)
    }

    /// Delete a sweet.
    ///
    /// # Errors
    ///
    /// Returns an error if the sweet does not exist or the caller is not admin.
    #[instrument(skip(self, token))]
    pub async fn delete_sweet(&self, token: &str, id: SweetId) -> Result<(), ApiError> {
        let request = Self::with_bearer(
            self.inner
                .http
                .delete(self.endpoint(&format!("sweets/{id}"))),
            Some(token),
        );
        Self::send(request).await?;
        self.invalidate_catalog().await;
        Ok(())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Submit an order request.
    ///
    /// The request carries only product IDs and quantities; the server prices
    /// the order and decrements stock.
    ///
    /// # Errors
    ///
    /// Returns an error for insufficient stock, unavailable products, or an
    /// empty item list.
    #[instrument(skip(self, token, request), fields(items = request.items.len()))]
    pub async fn place_order(&self, token: &str, request: &OrderRequest) -> Result<Order, ApiError> {
        self.post_json("orders/", Some(token), request).await
    }

    /// List orders: the caller's own, or all orders for an admin token.
    ///
    /// # Errors
    ///
    /// Returns an unauthorized error if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        self.get("orders/", Some(token)).await
    }

    /// Change an order's status (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist or the caller is not admin.
    #[instrument(skip(self, token))]
    pub async fn update_order_status(
        &self,
        token: &str,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let request = Self::with_bearer(
            self.inner
                .http
                .patch(self.endpoint(&format!("orders/{id}/status"))),
            Some(token),
        )
        .json(&OrderStatusUpdate { status });
        Self::send_json(request).await
    }

    // =========================================================================
    // User administration
    // =========================================================================

    /// List all user accounts (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin.
    #[instrument(skip(self, token))]
    pub async fn users(&self, token: &str) -> Result<Vec<Account>, ApiError> {
        self.get("users/", Some(token)).await
    }

    /// Set a user's admin flag (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the caller is not admin.
    #[instrument(skip(self, token))]
    pub async fn set_admin_flag(
        &self,
        token: &str,
        id: UserId,
        is_admin: bool,
    ) -> Result<Account, ApiError> {
        let request = Self::with_bearer(
            self.inner
                .http
                .patch(self.endpoint(&format!("users/{id}/admin"))),
            Some(token),
        )
        .json(&AdminFlagUpdate { is_admin });
        Self::send_json(request).await
    }
}
