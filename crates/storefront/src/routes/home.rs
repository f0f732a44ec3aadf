//! Shop page route handler.
//!
//! A single page shows the sellable catalog next to the session cart, so
//! every cart action redirects back here with a flash message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::Sweet;
use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::models::{Cart, CartLine, CurrentUser, session_keys};
use crate::routes::MessageQuery;
use crate::state::AppState;

// =============================================================================
// Display Views
// =============================================================================

/// Catalog item display data for templates.
#[derive(Clone)]
pub struct SweetView {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: String,
    pub stock_quantity: u32,
    /// Units of this sweet already in the cart.
    pub in_cart: u32,
    /// Whether one more unit can be added under the known stock level.
    pub can_add: bool,
}

impl SweetView {
    fn new(sweet: &Sweet, cart: &Cart) -> Self {
        let in_cart = cart
            .lines()
            .iter()
            .find(|l| l.sweet_id == sweet.id)
            .map_or(0, |l| l.quantity);

        Self {
            id: sweet.id.as_i32(),
            name: sweet.name.clone(),
            description: sweet.description.clone(),
            category: sweet.category.clone(),
            price: sweet.price.to_string(),
            stock_quantity: sweet.stock_quantity,
            in_cart,
            can_add: in_cart < sweet.stock_quantity,
        }
    }
}

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub sweet_id: i32,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub subtotal: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            sweet_id: line.sweet_id.as_i32(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.price_at_add.to_string(),
            subtotal: line.subtotal().to_string(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub unit_count: u32,
    pub is_empty: bool,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().iter().map(CartLineView::from).collect(),
            total: cart.total().to_string(),
            unit_count: cart.unit_count(),
            is_empty: cart.is_empty(),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart from the session, defaulting to empty.
pub(crate) async fn get_cart(session: &Session) -> Cart {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Save the cart back to the session.
pub(crate) async fn save_cart(
    session: &Session,
    cart: &Cart,
) -> std::result::Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

// =============================================================================
// Handler
// =============================================================================

/// Shop page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub sweets: Vec<SweetView>,
    pub cart: CartView,
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the shop page: sellable catalog plus the session cart.
#[instrument(skip(state, session, user))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let catalog = state.shop().catalog().await?;
    let cart = get_cart(&session).await;

    // Sweets that are unavailable or fully out of stock are not offered
    let sweets = catalog
        .iter()
        .filter(|s| s.is_sellable())
        .map(|s| SweetView::new(s, &cart))
        .collect();

    Ok(HomeTemplate {
        sweets,
        cart: CartView::from(&cart),
        current_user: user,
        error: query.error,
        success: query.success,
    })
}
