//! Integration test harness for the sweet shop storefront.
//!
//! Spawns two in-process servers per test: a mock sweet shop API and the
//! real storefront pointed at it, both on ephemeral ports. Tests drive the
//! storefront with a cookie-holding `reqwest` client, exactly as a browser
//! would, and reach into the mock's state to set up scenarios.
//!
//! ```rust,ignore
//! let ctx = TestContext::spawn().await;
//! ctx.login("customer@sweetshop.test", "caramel-999").await;
//! let response = ctx.post_form("/cart/add", &[("sweet_id", "3")]).await;
//! assert_eq!(response.status(), 303);
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

pub mod mock_api;

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::redirect::Policy;
use url::Url;

use sweet_shop_storefront::config::StorefrontConfig;
use sweet_shop_storefront::state::AppState;

pub use mock_api::MockApi;

/// One storefront plus its mock API, ready for requests.
pub struct TestContext {
    pub client: reqwest::Client,
    pub storefront_url: String,
    pub mock: MockApi,
}

async fn serve(app: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    addr
}

impl TestContext {
    /// Start the mock API and the storefront, wired together.
    pub async fn spawn() -> Self {
        let mock = MockApi::new();
        let api_addr = serve(mock.router()).await;

        let config = StorefrontConfig {
            api_url: Url::parse(&format!("http://{api_addr}/")).expect("mock api url"),
            host: "127.0.0.1".parse().expect("loopback"),
            port: 0,
            base_url: "http://localhost".to_string(),
            // Tests mutate the catalog through the mock; a long TTL would
            // serve stale snapshots, so expire almost immediately
            catalog_cache_ttl: Duration::from_millis(1),
            sentry_dsn: None,
        };

        let app_addr = serve(sweet_shop_storefront::app(AppState::new(config))).await;

        // Redirects carry the flash messages under test, so never follow them
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("reqwest client");

        Self {
            client,
            storefront_url: format!("http://{app_addr}"),
            mock,
        }
    }

    /// Absolute storefront URL for a path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    /// GET a storefront page.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request")
    }

    /// POST a form to the storefront.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request")
    }

    /// Log in through the real login flow, asserting it succeeded.
    pub async fn login(&self, email: &str, password: &str) {
        let response = self
            .post_form("/auth/login", &[("email", email), ("password", password)])
            .await;
        assert!(
            response.status().is_redirection(),
            "login did not redirect: {}",
            response.status()
        );
        let location = location_of(&response);
        assert_eq!(location, "/", "login failed, redirected to {location}");
    }
}

/// The `Location` header of a redirect response.
#[must_use]
pub fn location_of(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .expect("Location header")
        .to_str()
        .expect("ascii location")
        .to_string()
}

/// Decode a query parameter out of a redirect's `Location` value.
#[must_use]
pub fn query_param(location: &str, key: &str) -> Option<String> {
    let (_, query) = location.split_once('?')?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

/// Decode the flash message out of a redirect's query string.
#[must_use]
pub fn flash_message(location: &str, kind: &str) -> Option<String> {
    query_param(location, kind)
}
