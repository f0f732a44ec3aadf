//! Admin back-office route handlers.
//!
//! Every handler takes `RequireAdmin`; the API re-checks the admin flag on
//! each call, so these routes are UI gating, not the security boundary.
//! After any mutation the page re-fetches from the API rather than patching
//! its own view of the data.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use sweet_shop_core::{OrderId, OrderStatus, Price, SweetId, UserId};

use crate::api::{Account, Order, Sweet, SweetInput};
use crate::error::Result;
use crate::middleware::{RequireAdmin, expire_session};
use crate::models::CurrentUser;
use crate::routes::account::{OrderItemView, order_views};
use crate::routes::{MessageQuery, redirect_error, redirect_success};
use crate::state::AppState;

/// Redirect to login after the API rejected the admin's token.
async fn session_expired(session: &Session) -> Response {
    expire_session(session).await;
    redirect_error(
        "/auth/login",
        "Your session has expired, please log in again",
    )
}

// =============================================================================
// Product Management
// =============================================================================

/// Catalog row for the admin product table (includes hidden products).
#[derive(Clone)]
pub struct AdminSweetView {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub price: String,
    pub stock_quantity: u32,
    pub is_available: bool,
}

impl From<&Sweet> for AdminSweetView {
    fn from(sweet: &Sweet) -> Self {
        Self {
            id: sweet.id.as_i32(),
            name: sweet.name.clone(),
            category: sweet.category.clone(),
            price: sweet.price.to_string(),
            stock_quantity: sweet.stock_quantity,
            is_available: sweet.is_available,
        }
    }
}

/// Admin product list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/sweets.html")]
pub struct AdminSweetsTemplate {
    pub current_user: Option<CurrentUser>,
    pub sweets: Vec<AdminSweetView>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Product form template, shared by create and edit.
#[derive(Template, WebTemplate)]
#[template(path = "admin/sweet_form.html")]
pub struct SweetFormTemplate {
    pub current_user: Option<CurrentUser>,
    /// `None` for the create form.
    pub sweet_id: Option<i32>,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub stock_quantity: u32,
    pub is_available: bool,
    pub error: Option<String>,
}

impl SweetFormTemplate {
    fn blank(user: CurrentUser) -> Self {
        Self {
            current_user: Some(user),
            sweet_id: None,
            name: String::new(),
            description: String::new(),
            category: String::new(),
            price: String::new(),
            stock_quantity: 0,
            is_available: true,
            error: None,
        }
    }
}

/// Product create/update form data.
#[derive(Debug, Deserialize)]
pub struct SweetForm {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: String,
    pub stock_quantity: u32,
    /// Checkbox: present when ticked, absent otherwise.
    pub is_available: Option<String>,
}

impl SweetForm {
    /// Validate the form into an API payload.
    fn into_input(self) -> std::result::Result<SweetInput, String> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }
        let category = self.category.trim().to_string();
        if category.is_empty() {
            return Err("Category is required".to_string());
        }
        let price = Price::parse(&self.price).map_err(|e| e.to_string())?;

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(SweetInput {
            name,
            description,
            category,
            price,
            stock_quantity: self.stock_quantity,
            is_available: self.is_available.is_some(),
        })
    }
}

/// Display the product table (all products, hidden ones included).
#[instrument(skip(state, user))]
pub async fn sweets(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    // The admin table must show out-of-stock and hidden products, so it
    // bypasses the shopfront's sellable filter but shares the snapshot
    let catalog = state.shop().catalog().await?;

    Ok(AdminSweetsTemplate {
        current_user: Some(user),
        sweets: catalog.iter().map(AdminSweetView::from).collect(),
        error: query.error,
        success: query.success,
    }
    .into_response())
}

/// Display the empty product form.
pub async fn new_sweet(RequireAdmin(user): RequireAdmin) -> impl IntoResponse {
    SweetFormTemplate::blank(user)
}

/// Handle product creation.
#[instrument(skip(state, session, user, form), fields(name = %form.name))]
pub async fn create_sweet(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Form(form): Form<SweetForm>,
) -> Result<Response> {
    let input = match form.into_input() {
        Ok(input) => input,
        Err(message) => return Ok(redirect_error("/admin/sweets/new", &message)),
    };

    match state.shop().create_sweet(user.token(), &input).await {
        Ok(sweet) => Ok(redirect_success(
            "/admin/sweets",
            &format!("Created {}", sweet.name),
        )),
        Err(e) if e.is_unauthorized() => Ok(session_expired(&session).await),
        Err(e) => Ok(redirect_error("/admin/sweets/new", &e.user_message())),
    }
}

/// Display the product form pre-filled for editing.
#[instrument(skip(state, user))]
pub async fn edit_sweet(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Response> {
    let sweet = match state.shop().sweet(SweetId::new(id)).await {
        Ok(sweet) => sweet,
        Err(e) if e.is_not_found() => {
            return Ok(redirect_error("/admin/sweets", "Sweet not found"));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(SweetFormTemplate {
        current_user: Some(user),
        sweet_id: Some(sweet.id.as_i32()),
        name: sweet.name,
        description: sweet.description.unwrap_or_default(),
        category: sweet.category,
        price: sweet.price.amount().to_string(),
        stock_quantity: sweet.stock_quantity,
        is_available: sweet.is_available,
        error: None,
    }
    .into_response())
}

/// Handle product update.
#[instrument(skip(state, session, user, form))]
pub async fn update_sweet(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<i32>,
    Form(form): Form<SweetForm>,
) -> Result<Response> {
    let edit_path = format!("/admin/sweets/{id}/edit");
    let input = match form.into_input() {
        Ok(input) => input,
        Err(message) => return Ok(redirect_error(&edit_path, &message)),
    };

    match state
        .shop()
        .update_sweet(user.token(), SweetId::new(id), &input)
        .await
    {
        Ok(sweet) => Ok(redirect_success(
            "/admin/sweets",
            &format!("Updated {}", sweet.name),
        )),
        Err(e) if e.is_unauthorized() => Ok(session_expired(&session).await),
        Err(e) => Ok(redirect_error(&edit_path, &e.user_message())),
    }
}

/// Handle product deletion.
///
/// The confirm dialog lives in the template; by the time this runs the
/// admin has already agreed.
#[instrument(skip(state, session, user))]
pub async fn delete_sweet(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Response> {
    match state.shop().delete_sweet(user.token(), SweetId::new(id)).await {
        Ok(()) => Ok(redirect_success("/admin/sweets", "Sweet deleted")),
        Err(e) if e.is_unauthorized() => Ok(session_expired(&session).await),
        Err(e) => Ok(redirect_error("/admin/sweets", &e.user_message())),
    }
}

// =============================================================================
// Order Management
// =============================================================================

/// Order row for the admin order table.
#[derive(Clone)]
pub struct AdminOrderView {
    pub id: i32,
    pub purchaser: String,
    pub status: String,
    pub placed_at: String,
    pub total: String,
    pub items: Vec<OrderItemView>,
    /// Select options for the status dropdown, current one pre-selected.
    pub status_options: Vec<StatusOption>,
}

/// One `<option>` in the order status dropdown.
#[derive(Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub selected: bool,
}

fn admin_order_views(orders: Vec<Order>) -> Vec<AdminOrderView> {
    let purchasers: std::collections::HashMap<i32, String> = orders
        .iter()
        .map(|o| {
            let label = o
                .user_email
                .as_ref()
                .map_or_else(|| format!("user #{}", o.owner_id), |e| e.as_str().to_string());
            (o.id.as_i32(), label)
        })
        .collect();

    order_views(orders)
        .into_iter()
        .map(|v| AdminOrderView {
            purchaser: purchasers.get(&v.id).cloned().unwrap_or_default(),
            status_options: OrderStatus::ALL
                .iter()
                .map(|s| StatusOption {
                    value: s.as_str(),
                    selected: s.as_str() == v.status,
                })
                .collect(),
            id: v.id,
            status: v.status,
            placed_at: v.placed_at,
            total: v.total,
            items: v.items,
        })
        .collect()
}

/// Admin order list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct AdminOrdersTemplate {
    pub current_user: Option<CurrentUser>,
    pub orders: Vec<AdminOrderView>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Order status form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Display every order in the system, newest first.
#[instrument(skip(state, session, user))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let orders = match state.shop().orders(user.token()).await {
        Ok(orders) => orders,
        Err(e) if e.is_unauthorized() => return Ok(session_expired(&session).await),
        Err(e) => return Err(e.into()),
    };

    Ok(AdminOrdersTemplate {
        current_user: Some(user),
        orders: admin_order_views(orders),
        error: query.error,
        success: query.success,
    }
    .into_response())
}

/// Handle an order status change.
#[instrument(skip(state, session, user))]
pub async fn update_order_status(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<i32>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    // Reject unknown status strings before they reach the API
    let Ok(status) = form.status.parse::<OrderStatus>() else {
        return Ok(redirect_error("/admin/orders", "Unknown order status"));
    };

    match state
        .shop()
        .update_order_status(user.token(), OrderId::new(id), status)
        .await
    {
        Ok(order) => Ok(redirect_success(
            "/admin/orders",
            &format!("Order #{} is now {}", order.id, order.status),
        )),
        Err(e) if e.is_unauthorized() => Ok(session_expired(&session).await),
        Err(e) => Ok(redirect_error("/admin/orders", &e.user_message())),
    }
}

// =============================================================================
// User Management
// =============================================================================

/// User row for the admin user table.
#[derive(Clone)]
pub struct AdminUserView {
    pub id: i32,
    pub label: String,
    pub is_admin: bool,
    pub joined_at: String,
    /// True for the signed-in admin's own row; the demote button is disabled.
    pub is_self: bool,
}

impl AdminUserView {
    fn new(account: &Account, viewer: UserId) -> Self {
        Self {
            id: account.id.as_i32(),
            label: account
                .email
                .as_ref()
                .map_or_else(|| format!("user #{}", account.id), |e| e.as_str().to_string()),
            is_admin: account.is_admin,
            joined_at: account
                .created_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            is_self: account.id == viewer,
        }
    }
}

/// Admin user list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct AdminUsersTemplate {
    pub current_user: Option<CurrentUser>,
    pub users: Vec<AdminUserView>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Admin flag form data.
#[derive(Debug, Deserialize)]
pub struct AdminFlagForm {
    /// The flag to set, not the current one.
    pub is_admin: bool,
}

/// Display every user account.
#[instrument(skip(state, session, user))]
pub async fn users(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let accounts = match state.shop().users(user.token()).await {
        Ok(accounts) => accounts,
        Err(e) if e.is_unauthorized() => return Ok(session_expired(&session).await),
        Err(e) => return Err(e.into()),
    };

    let views = accounts
        .iter()
        .map(|a| AdminUserView::new(a, user.id))
        .collect();

    Ok(AdminUsersTemplate {
        current_user: Some(user),
        users: views,
        error: query.error,
        success: query.success,
    }
    .into_response())
}

/// Handle an admin flag toggle.
///
/// Self-demotion is rejected here before any network call: an admin locking
/// themselves out of the page they are on is never what they meant.
#[instrument(skip(state, session, user))]
pub async fn toggle_admin(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<i32>,
    Form(form): Form<AdminFlagForm>,
) -> Result<Response> {
    let target = UserId::new(id);
    if target == user.id && !form.is_admin {
        return Ok(redirect_error(
            "/admin/users",
            "You cannot remove your own admin access",
        ));
    }

    match state
        .shop()
        .set_admin_flag(user.token(), target, form.is_admin)
        .await
    {
        Ok(account) => {
            let label = account
                .email
                .as_ref()
                .map_or_else(|| format!("user #{}", account.id), |e| e.as_str().to_string());
            let verb = if account.is_admin { "now" } else { "no longer" };
            Ok(redirect_success(
                "/admin/users",
                &format!("{label} is {verb} an admin"),
            ))
        }
        Err(e) if e.is_unauthorized() => Ok(session_expired(&session).await),
        Err(e) => Ok(redirect_error("/admin/users", &e.user_message())),
    }
}
