//! Wire types for the sweet shop REST API.
//!
//! These mirror the server's schemas exactly; the client neither adds fields
//! nor fills in defaults beyond what the schema marks optional.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sweet_shop_core::{Email, OrderId, OrderItemId, OrderStatus, Price, SweetId, UserId};

/// A sellable catalog item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sweet {
    pub id: SweetId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub price: Price,
    pub stock_quantity: u32,
    pub is_available: bool,
}

impl Sweet {
    /// Whether this sweet should be offered for sale right now.
    #[must_use]
    pub const fn is_sellable(&self) -> bool {
        self.is_available && self.stock_quantity > 0
    }
}

/// Fields for creating or updating a sweet (admin only).
#[derive(Debug, Clone, Serialize)]
pub struct SweetInput {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: Price,
    pub stock_quantity: u32,
    pub is_available: bool,
}

/// Token issued by `POST /auth/token` and `POST /auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Advisory role string; the `/users/me` response is authoritative.
    #[serde(default)]
    pub user_role: Option<String>,
}

/// The authenticated identity from `GET /users/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    /// May be absent in some payload versions; display falls back to the ID.
    #[serde(default)]
    pub email: Option<Email>,
    pub is_admin: bool,
}

/// A user row from the admin listing (`GET /users/`).
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<Email>,
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Request body for `POST /orders/`.
///
/// Prices are deliberately absent: the server prices the order from its own
/// current catalog state.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub items: Vec<OrderItemRequest>,
}

/// One product/quantity pair in an order request.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemRequest {
    pub sweet_id: SweetId,
    pub quantity: u32,
}

/// A persisted order returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner_id: UserId,
    pub status: OrderStatus,
    pub total_price: Price,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// Present only in admin listings (joined purchaser email).
    #[serde(default)]
    pub user_email: Option<Email>,
}

/// One line item of a persisted order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub sweet_id: SweetId,
    pub quantity: u32,
    pub price_at_purchase: Price,
    /// Product name at listing time; absent if the product was deleted.
    #[serde(default)]
    pub name: Option<String>,
}

/// Body for `PATCH /orders/{id}/status`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// Body for `PATCH /users/{id}/admin`.
#[derive(Debug, Clone, Serialize)]
pub struct AdminFlagUpdate {
    pub is_admin: bool,
}

/// Body for `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}
