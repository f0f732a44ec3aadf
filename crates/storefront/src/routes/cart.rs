//! Cart and checkout route handlers.
//!
//! The cart lives entirely in the session; no network call happens until
//! checkout. Every action redirects back to the shop page, carrying any
//! rejection message in the query string.

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use sweet_shop_core::SweetId;

use crate::error::Result;
use crate::middleware::{OptionalAuth, expire_session};
use crate::models::Cart;
use crate::routes::home::{get_cart, save_cart};
use crate::routes::{redirect_error, redirect_success};
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub sweet_id: i32,
}

/// Quantity adjustment form data.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub sweet_id: i32,
    /// Signed shift, e.g. `-1` for the minus button.
    pub delta: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub sweet_id: i32,
}

/// Add one unit of a sweet to the cart.
///
/// The stock guard runs against the current catalog snapshot; a rejected add
/// leaves the cart untouched and surfaces the reason as a flash message.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddForm>,
) -> Result<Response> {
    let sweet_id = SweetId::new(form.sweet_id);
    let catalog = state.shop().catalog().await?;

    let Some(sweet) = catalog.iter().find(|s| s.id == sweet_id) else {
        // Stale page: the product was removed since the snapshot rendered
        state.shop().invalidate_catalog().await;
        return Ok(redirect_error("/", "That sweet is no longer available"));
    };

    let mut cart = get_cart(&session).await;
    if let Err(e) = cart.add(sweet) {
        return Ok(redirect_error("/", &e.to_string()));
    }

    save_cart(&session, &cart).await?;
    Ok(Redirect::to("/").into_response())
}

/// Shift a line's quantity by a signed delta.
///
/// Dropping to zero or below removes the line.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateForm>) -> Result<Response> {
    let mut cart = get_cart(&session).await;
    cart.adjust_quantity(SweetId::new(form.sweet_id), form.delta);
    save_cart(&session, &cart).await?;
    Ok(Redirect::to("/").into_response())
}

/// Remove a line from the cart entirely.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveForm>) -> Result<Response> {
    let mut cart = get_cart(&session).await;
    cart.remove(SweetId::new(form.sweet_id));
    save_cart(&session, &cart).await?;
    Ok(Redirect::to("/").into_response())
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Response> {
    let mut cart = get_cart(&session).await;
    cart.clear();
    save_cart(&session, &cart).await?;
    Ok(Redirect::to("/").into_response())
}

/// Submit the cart as an order.
///
/// An empty cart never reaches the network; a missing login redirects to the
/// login page with the cart intact. On a rejected order (insufficient stock,
/// expired token) the cart is also left untouched so the user can adjust and
/// retry.
#[instrument(skip(state, session, user))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    let cart = get_cart(&session).await;
    if cart.is_empty() {
        return Ok(redirect_error("/", "Your cart is empty"));
    }

    let Some(user) = user else {
        return Ok(redirect_error(
            "/auth/login",
            "Please log in to place your order",
        ));
    };

    match state.shop().place_order(user.token(), &cart.order_request()).await {
        Ok(order) => {
            // The order consumed stock on the server: drop the cart and the
            // stale snapshot together
            save_cart(&session, &Cart::default()).await?;
            state.shop().invalidate_catalog().await;
            Ok(redirect_success(
                "/",
                &format!("Order #{} placed. Total: {}", order.id, order.total_price),
            ))
        }
        Err(e) if e.is_unauthorized() => {
            expire_session(&session).await;
            Ok(redirect_error(
                "/auth/login",
                "Your session has expired, please log in again",
            ))
        }
        Err(e) => {
            // Cart stays as-is; stock may have moved under us, so refetch
            state.shop().invalidate_catalog().await;
            Ok(redirect_error("/", &e.user_message()))
        }
    }
}
