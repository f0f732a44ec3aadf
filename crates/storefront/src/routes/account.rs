//! Account route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse, response::Response};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{Order, OrderItem};
use crate::error::Result;
use crate::middleware::{RequireAuth, expire_session};
use crate::models::CurrentUser;
use crate::routes::redirect_error;
use crate::state::AppState;

// =============================================================================
// Display Views
// =============================================================================

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub id: i32,
    pub status: String,
    pub placed_at: String,
    pub total: String,
    pub items: Vec<OrderItemView>,
}

/// Order line display data for templates.
#[derive(Clone)]
pub struct OrderItemView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            // The product may have been deleted since the order was placed
            name: item
                .name
                .clone()
                .unwrap_or_else(|| format!("Sweet #{}", item.sweet_id)),
            quantity: item.quantity,
            unit_price: item.price_at_purchase.to_string(),
        }
    }
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.as_i32(),
            status: order.status.to_string(),
            placed_at: order.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            total: order.total_price.to_string(),
            items: order.items.iter().map(OrderItemView::from).collect(),
        }
    }
}

/// Sort orders newest first and convert for display.
pub(crate) fn order_views(mut orders: Vec<Order>) -> Vec<OrderView> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders.iter().map(OrderView::from).collect()
}

// =============================================================================
// Handler
// =============================================================================

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub current_user: Option<CurrentUser>,
    pub orders: Vec<OrderView>,
}

/// Display the signed-in user's order history, newest first.
#[instrument(skip(state, session, user))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let orders = match state.shop().orders(user.token()).await {
        Ok(orders) => orders,
        Err(e) if e.is_unauthorized() => {
            expire_session(&session).await;
            return Ok(redirect_error(
                "/auth/login",
                "Your session has expired, please log in again",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(OrdersTemplate {
        current_user: Some(user),
        orders: order_views(orders),
    }
    .into_response())
}
