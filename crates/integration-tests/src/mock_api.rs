//! In-process stand-in for the sweet shop REST API.
//!
//! Speaks the same wire protocol as the real service, including its error
//! envelope: `{"detail": "..."}` with business-rule messages like
//! `Insufficient stock for Ladoo. Requested: 5, Available: 2`. State lives
//! behind a mutex that tests can reach directly to set up scenarios.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone, Serialize)]
pub struct MockSweet {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: f64,
    pub stock_quantity: u32,
    pub is_available: bool,
}

#[derive(Clone)]
pub struct MockUser {
    pub id: i32,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Serialize)]
pub struct MockOrderItem {
    pub id: i32,
    pub order_id: i32,
    pub sweet_id: i32,
    pub quantity: u32,
    pub price_at_purchase: f64,
    pub name: Option<String>,
}

#[derive(Clone, Serialize)]
pub struct MockOrder {
    pub id: i32,
    pub owner_id: i32,
    pub status: String,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<MockOrderItem>,
    pub user_email: Option<String>,
}

/// Mutable world behind the mock API.
pub struct MockData {
    pub sweets: Vec<MockSweet>,
    pub users: Vec<MockUser>,
    pub orders: Vec<MockOrder>,
    pub tokens: HashMap<String, i32>,
    /// How many times `POST /auth/token` has been hit.
    pub token_requests: u32,
    next_id: i32,
    token_counter: u32,
}

impl MockData {
    fn seeded() -> Self {
        let mut data = Self {
            sweets: Vec::new(),
            users: Vec::new(),
            orders: Vec::new(),
            tokens: HashMap::new(),
            token_requests: 0,
            next_id: 1,
            token_counter: 0,
        };

        data.add_user("admin@sweetshop.test", "sugar-rush-8", true);
        data.add_user("customer@sweetshop.test", "caramel-999", false);

        data.add_sweet("Ladoo", "Traditional", 2.0, 10, true);
        data.add_sweet("Barfi", "Milk", 3.0, 3, true);
        data.add_sweet("Sold Out Fudge", "Chocolate", 4.0, 0, true);
        data.add_sweet("Secret Batch", "Chocolate", 5.0, 5, false);

        data
    }

    fn fresh_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_user(&mut self, email: &str, password: &str, is_admin: bool) -> i32 {
        let id = self.fresh_id();
        self.users.push(MockUser {
            id,
            email: email.to_string(),
            password: password.to_string(),
            is_admin,
            created_at: Utc::now() - Duration::days(i64::from(id)),
        });
        id
    }

    pub fn add_sweet(
        &mut self,
        name: &str,
        category: &str,
        price: f64,
        stock: u32,
        available: bool,
    ) -> i32 {
        let id = self.fresh_id();
        self.sweets.push(MockSweet {
            id,
            name: name.to_string(),
            description: None,
            category: category.to_string(),
            price,
            stock_quantity: stock,
            is_available: available,
        });
        id
    }

    fn issue_token(&mut self, user_id: i32) -> String {
        self.token_counter += 1;
        let token = format!("mock-token-{user_id}-{}", self.token_counter);
        self.tokens.insert(token.clone(), user_id);
        token
    }

    /// Invalidate every issued token, as if they all expired.
    pub fn revoke_tokens(&mut self) {
        self.tokens.clear();
    }

    pub fn set_stock(&mut self, sweet_id: i32, stock: u32) {
        if let Some(sweet) = self.sweets.iter_mut().find(|s| s.id == sweet_id) {
            sweet.stock_quantity = stock;
        }
    }

    pub fn sweet_named(&self, name: &str) -> Option<&MockSweet> {
        self.sweets.iter().find(|s| s.name == name)
    }

    fn user_for_token(&self, headers: &HeaderMap) -> Option<&MockUser> {
        let header = headers.get("authorization")?.to_str().ok()?;
        let token = header.strip_prefix("Bearer ")?;
        let user_id = self.tokens.get(token)?;
        self.users.iter().find(|u| u.id == *user_id)
    }

    fn user_profile(user: &MockUser) -> serde_json::Value {
        json!({
            "id": user.id,
            "email": user.email,
            "is_admin": user.is_admin,
            "created_at": user.created_at,
        })
    }
}

/// Shared handle to the mock world.
#[derive(Clone)]
pub struct MockApi {
    data: Arc<Mutex<MockData>>,
}

impl MockApi {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(MockData::seeded())),
        }
    }

    /// Lock the world for direct inspection or scenario setup.
    ///
    /// # Panics
    ///
    /// Panics if a previous holder poisoned the lock.
    #[must_use]
    pub fn lock(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().expect("mock state poisoned")
    }

    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/auth/token", post(login))
            .route("/auth/register", post(register))
            .route("/users/me", get(me))
            .route("/users/", get(list_users))
            .route("/users/{id}/admin", patch(set_admin))
            .route("/sweets/", get(list_sweets).post(create_sweet))
            .route(
                "/sweets/{id}",
                get(get_sweet).put(update_sweet).delete(delete_sweet),
            )
            .route("/orders/", get(list_orders).post(create_order))
            .route("/orders/{id}/status", patch(set_order_status))
            .with_state(self.clone())
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn unauthorized() -> Response {
    detail(StatusCode::UNAUTHORIZED, "Could not validate credentials")
}

fn forbidden() -> Response {
    detail(StatusCode::FORBIDDEN, "Not enough permissions")
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Deserialize)]
struct TokenForm {
    username: String,
    password: String,
}

async fn login(State(api): State<MockApi>, Form(form): Form<TokenForm>) -> Response {
    let mut data = api.lock();
    data.token_requests += 1;
    let Some(user) = data
        .users
        .iter()
        .find(|u| u.email == form.username && u.password == form.password)
        .cloned()
    else {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect username or password");
    };

    let token = data.issue_token(user.id);
    Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "user_role": if user.is_admin { "admin" } else { "customer" },
    }))
    .into_response()
}

#[derive(Deserialize)]
struct RegisterBody {
    email: String,
    password: String,
}

async fn register(State(api): State<MockApi>, Json(body): Json<RegisterBody>) -> Response {
    let mut data = api.lock();
    if data.users.iter().any(|u| u.email == body.email) {
        return detail(StatusCode::BAD_REQUEST, "Email already registered");
    }
    if body.password.len() < 8 {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "detail": [{
                    "loc": ["body", "password"],
                    "msg": "ensure this value has at least 8 characters",
                    "type": "value_error",
                }]
            })),
        )
            .into_response();
    }

    let user_id = data.add_user(&body.email, &body.password, false);
    let token = data.issue_token(user_id);
    (
        StatusCode::CREATED,
        Json(json!({
            "access_token": token,
            "token_type": "bearer",
            "user_role": "customer",
        })),
    )
        .into_response()
}

async fn me(State(api): State<MockApi>, headers: HeaderMap) -> Response {
    let data = api.lock();
    match data.user_for_token(&headers) {
        Some(user) => Json(MockData::user_profile(user)).into_response(),
        None => unauthorized(),
    }
}

// =============================================================================
// Users (admin)
// =============================================================================

async fn list_users(State(api): State<MockApi>, headers: HeaderMap) -> Response {
    let data = api.lock();
    let Some(caller) = data.user_for_token(&headers) else {
        return unauthorized();
    };
    if !caller.is_admin {
        return forbidden();
    }

    let users: Vec<_> = data.users.iter().map(MockData::user_profile).collect();
    Json(users).into_response()
}

#[derive(Deserialize)]
struct AdminFlagBody {
    is_admin: bool,
}

async fn set_admin(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Json(body): Json<AdminFlagBody>,
) -> Response {
    let mut data = api.lock();
    let Some(caller) = data.user_for_token(&headers) else {
        return unauthorized();
    };
    if !caller.is_admin {
        return forbidden();
    }

    let Some(user) = data.users.iter_mut().find(|u| u.id == id) else {
        return detail(StatusCode::NOT_FOUND, "User not found");
    };
    user.is_admin = body.is_admin;
    let user = user.clone();
    Json(MockData::user_profile(&user)).into_response()
}

// =============================================================================
// Sweets
// =============================================================================

async fn list_sweets(State(api): State<MockApi>) -> Response {
    let data = api.lock();
    Json(data.sweets.clone()).into_response()
}

async fn get_sweet(State(api): State<MockApi>, Path(id): Path<i32>) -> Response {
    let data = api.lock();
    match data.sweets.iter().find(|s| s.id == id) {
        Some(sweet) => Json(sweet.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Sweet not found"),
    }
}

#[derive(Deserialize)]
struct SweetBody {
    name: String,
    description: Option<String>,
    category: String,
    price: f64,
    stock_quantity: u32,
    is_available: bool,
}

async fn create_sweet(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Json(body): Json<SweetBody>,
) -> Response {
    let mut data = api.lock();
    let Some(caller) = data.user_for_token(&headers) else {
        return unauthorized();
    };
    if !caller.is_admin {
        return forbidden();
    }
    if data.sweets.iter().any(|s| s.name == body.name) {
        return detail(StatusCode::BAD_REQUEST, "Sweet with this name already exists");
    }

    let id = data.fresh_id();
    let sweet = MockSweet {
        id,
        name: body.name,
        description: body.description,
        category: body.category,
        price: body.price,
        stock_quantity: body.stock_quantity,
        is_available: body.is_available,
    };
    data.sweets.push(sweet.clone());
    (StatusCode::CREATED, Json(sweet)).into_response()
}

async fn update_sweet(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Json(body): Json<SweetBody>,
) -> Response {
    let mut data = api.lock();
    let Some(caller) = data.user_for_token(&headers) else {
        return unauthorized();
    };
    if !caller.is_admin {
        return forbidden();
    }

    let Some(sweet) = data.sweets.iter_mut().find(|s| s.id == id) else {
        return detail(StatusCode::NOT_FOUND, "Sweet not found");
    };
    sweet.name = body.name;
    sweet.description = body.description;
    sweet.category = body.category;
    sweet.price = body.price;
    sweet.stock_quantity = body.stock_quantity;
    sweet.is_available = body.is_available;
    Json(sweet.clone()).into_response()
}

async fn delete_sweet(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Response {
    let mut data = api.lock();
    let Some(caller) = data.user_for_token(&headers) else {
        return unauthorized();
    };
    if !caller.is_admin {
        return forbidden();
    }

    let before = data.sweets.len();
    data.sweets.retain(|s| s.id != id);
    if data.sweets.len() == before {
        return detail(StatusCode::NOT_FOUND, "Sweet not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Deserialize)]
struct OrderItemBody {
    sweet_id: i32,
    quantity: u32,
}

#[derive(Deserialize)]
struct OrderBody {
    items: Vec<OrderItemBody>,
}

async fn create_order(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Json(body): Json<OrderBody>,
) -> Response {
    let mut data = api.lock();
    let Some(caller) = data.user_for_token(&headers).cloned() else {
        return unauthorized();
    };
    if body.items.is_empty() {
        return detail(StatusCode::BAD_REQUEST, "Order must contain at least one item");
    }

    // Validate everything before mutating any stock
    for item in &body.items {
        let Some(sweet) = data.sweets.iter().find(|s| s.id == item.sweet_id) else {
            return detail(StatusCode::NOT_FOUND, "Sweet not found");
        };
        if !sweet.is_available {
            return detail(
                StatusCode::BAD_REQUEST,
                &format!("{} is not available", sweet.name),
            );
        }
        if item.quantity > sweet.stock_quantity {
            return detail(
                StatusCode::BAD_REQUEST,
                &format!(
                    "Insufficient stock for {}. Requested: {}, Available: {}",
                    sweet.name, item.quantity, sweet.stock_quantity
                ),
            );
        }
    }

    let order_id = data.fresh_id();
    let mut items = Vec::new();
    let mut total = 0.0;
    for item in &body.items {
        let item_id = data.fresh_id();
        let sweet = data
            .sweets
            .iter_mut()
            .find(|s| s.id == item.sweet_id)
            .expect("validated above");
        sweet.stock_quantity -= item.quantity;
        total += sweet.price * f64::from(item.quantity);
        items.push(MockOrderItem {
            id: item_id,
            order_id,
            sweet_id: sweet.id,
            quantity: item.quantity,
            price_at_purchase: sweet.price,
            name: Some(sweet.name.clone()),
        });
    }

    let order = MockOrder {
        id: order_id,
        owner_id: caller.id,
        status: "Pending".to_string(),
        total_price: total,
        created_at: Utc::now(),
        items,
        user_email: None,
    };
    data.orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn list_orders(State(api): State<MockApi>, headers: HeaderMap) -> Response {
    let data = api.lock();
    let Some(caller) = data.user_for_token(&headers) else {
        return unauthorized();
    };

    let orders: Vec<MockOrder> = if caller.is_admin {
        // Admin listing joins the purchaser's email
        data.orders
            .iter()
            .map(|o| {
                let mut order = o.clone();
                order.user_email = data
                    .users
                    .iter()
                    .find(|u| u.id == o.owner_id)
                    .map(|u| u.email.clone());
                order
            })
            .collect()
    } else {
        data.orders
            .iter()
            .filter(|o| o.owner_id == caller.id)
            .cloned()
            .collect()
    };
    Json(orders).into_response()
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
}

async fn set_order_status(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Json(body): Json<StatusBody>,
) -> Response {
    let mut data = api.lock();
    let Some(caller) = data.user_for_token(&headers) else {
        return unauthorized();
    };
    if !caller.is_admin {
        return forbidden();
    }

    let Some(order) = data.orders.iter_mut().find(|o| o.id == id) else {
        return detail(StatusCode::NOT_FOUND, "Order not found");
    };
    order.status = body.status;
    Json(order.clone()).into_response()
}
