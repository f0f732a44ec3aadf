//! Authentication route handlers.
//!
//! Login exchanges credentials for a bearer token at the API, then resolves
//! the identity behind it; both land in the session together. Registration
//! chains straight into login so a new user arrives signed in.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::routes::{MessageQuery, redirect_error};
use crate::state::AppState;

/// Minimum password length enforced before the request leaves the browser
/// form; the API enforces the same bound.
const MIN_PASSWORD_LENGTH: usize = 8;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
///
/// `next` is the destination to resume after signing in, planted as a hidden
/// field when the visitor was bounced here from a protected page.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Query parameter carrying the post-login destination.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Clamp a post-login destination to a local path.
///
/// Anything that could leave the site (absolute URLs, scheme-relative
/// `//host` forms) falls back to the home page.
fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/".to_string(),
    }
}

/// Login page path that keeps the destination across a failed attempt.
fn login_path(next: &str) -> String {
    if next == "/" {
        "/auth/login".to_string()
    } else {
        format!("/auth/login?next={}", urlencoding::encode(next))
    }
}

/// Display the login page.
pub async fn login_page(
    Query(query): Query<MessageQuery>,
    Query(dest): Query<NextQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        error: query.error,
        success: query.success,
        next: safe_next(dest.next.as_deref()),
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref());
    let token = match state.shop().login(&form.email, &form.password).await {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            return Ok(redirect_error(&login_path(&next), &e.user_message()));
        }
    };

    sign_in(&state, &session, token.access_token, &next).await
}

/// Resolve the identity behind a fresh token, store it in the session, and
/// land on `next`.
async fn sign_in(
    state: &AppState,
    session: &Session,
    access_token: String,
    next: &str,
) -> Result<Response> {
    let profile = match state.shop().current_user(&access_token).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!("Failed to resolve identity after login: {e}");
            return Ok(redirect_error(&login_path(next), &e.user_message()));
        }
    };

    let user = CurrentUser::new(profile, access_token);
    set_sentry_user(&user.id, user.email.as_ref().map(sweet_shop_core::Email::as_str));
    set_current_user(session, &user).await?;

    Ok(Redirect::to(next).into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    RegisterTemplate { error: query.error }
}

/// Handle registration form submission.
///
/// Local checks (password match and length) run before any network call;
/// their failure leaves no trace at the API.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    if form.password != form.password_confirm {
        return Ok(redirect_error("/auth/register", "Passwords do not match"));
    }
    if form.password.len() < MIN_PASSWORD_LENGTH {
        return Ok(redirect_error(
            "/auth/register",
            "Password must be at least 8 characters",
        ));
    }

    if let Err(e) = state.shop().register(&form.email, &form.password).await {
        tracing::warn!("Registration failed: {e}");
        return Ok(redirect_error("/auth/register", &e.user_message()));
    }

    // Fresh accounts go through the same token exchange as a returning user
    let token = match state.shop().login(&form.email, &form.password).await {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!("Login after registration failed: {e}");
            return Ok(redirect_error("/auth/login", &e.user_message()));
        }
    };

    sign_in(&state, &session, token.access_token, "/").await
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout.
///
/// The token is stateless on the API side, so logout is purely local: drop
/// the whole session, identity and cart both.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }

    // Also destroy the entire session (drops the cart too)
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {e}");
    }

    clear_sentry_user();

    Redirect::to("/auth/login").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_keeps_local_paths() {
        assert_eq!(safe_next(Some("/account/orders")), "/account/orders");
        assert_eq!(safe_next(Some("/admin/sweets?success=x")), "/admin/sweets?success=x");
    }

    #[test]
    fn next_defaults_to_home() {
        assert_eq!(safe_next(None), "/");
        assert_eq!(safe_next(Some("")), "/");
    }

    #[test]
    fn next_rejects_offsite_targets() {
        assert_eq!(safe_next(Some("https://example.com/phish")), "/");
        assert_eq!(safe_next(Some("//example.com")), "/");
        assert_eq!(safe_next(Some("javascript:alert(1)")), "/");
    }

    #[test]
    fn login_path_encodes_the_destination() {
        assert_eq!(login_path("/"), "/auth/login");
        assert_eq!(login_path("/account/orders"), "/auth/login?next=%2Faccount%2Forders");
    }
}
