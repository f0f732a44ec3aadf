//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Shop page (catalog + cart)
//! GET  /health                 - Health check
//!
//! # Cart (session-held; all actions redirect back to /)
//! POST /cart/add               - Add one unit of a sweet
//! POST /cart/update            - Shift a line quantity by a delta
//! POST /cart/remove            - Remove a line
//! POST /cart/clear             - Empty the cart
//!
//! # Checkout
//! POST /checkout               - Submit the cart as an order
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//!
//! # Account (requires auth)
//! GET  /account/orders         - Order history
//!
//! # Admin (requires admin)
//! GET  /admin/sweets           - Product list
//! GET  /admin/sweets/new       - New product form
//! POST /admin/sweets           - Create product
//! GET  /admin/sweets/{id}/edit - Edit product form
//! POST /admin/sweets/{id}      - Update product
//! POST /admin/sweets/{id}/delete - Delete product
//! GET  /admin/orders           - All orders
//! POST /admin/orders/{id}/status - Change order status
//! GET  /admin/users            - User list
//! POST /admin/users/{id}/admin - Toggle admin flag
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod home;

use axum::{
    Router,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new().route("/orders", get(account::orders))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/sweets", get(admin::sweets).post(admin::create_sweet))
        .route("/sweets/new", get(admin::new_sweet))
        .route("/sweets/{id}", post(admin::update_sweet))
        .route("/sweets/{id}/edit", get(admin::edit_sweet))
        .route("/sweets/{id}/delete", post(admin::delete_sweet))
        .route("/orders", get(admin::orders))
        .route("/orders/{id}/status", post(admin::update_order_status))
        .route("/users", get(admin::users))
        .route("/users/{id}/admin", post(admin::toggle_admin))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .nest("/cart", cart_routes())
        .route("/checkout", post(cart::checkout))
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .nest("/admin", admin_routes())
}

/// Health check endpoint.
async fn health() -> &'static str {
    "OK"
}

/// Redirect back to a page with a flash message in the query string.
///
/// The message text comes from user input or the API, so it is always
/// URL-encoded before landing in the `Location` header.
pub(crate) fn redirect_with(path: &str, kind: &str, message: &str) -> Response {
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!(
        "{path}{separator}{kind}={}",
        urlencoding::encode(message)
    ))
    .into_response()
}

/// Redirect with an `error` flash message.
pub(crate) fn redirect_error(path: &str, message: &str) -> Response {
    redirect_with(path, "error", message)
}

/// Redirect with a `success` flash message.
pub(crate) fn redirect_success(path: &str, message: &str) -> Response {
    redirect_with(path, "success", message)
}

/// Query parameters for error/success display.
#[derive(Debug, serde::Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}
