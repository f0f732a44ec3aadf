//! Authentication extractors.
//!
//! Handlers declare what they need (`RequireAuth`, `RequireAdmin`,
//! `OptionalAuth`); the extractors pull the identity out of the session and
//! redirect browsers to the login page when it is missing.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{Cart, CurrentUser, session_keys};

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name())
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a signed-in admin.
///
/// Non-admin users get a redirect home rather than a bare 403: the admin
/// links are hidden from them, so reaching here means a typed-in URL.
pub struct RequireAdmin(pub CurrentUser);

/// Rejection for the auth extractors.
pub enum AuthRejection {
    /// Redirect to the login page, remembering where the visitor was headed
    /// so a successful login can send them back.
    RedirectToLogin { next: String },
    /// Redirect home (signed in, but not an admin).
    RedirectHome,
    /// Session machinery unavailable.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => {
                let target = if next == "/" {
                    "/auth/login".to_string()
                } else {
                    format!("/auth/login?next={}", urlencoding::encode(&next))
                };
                Redirect::to(&target).into_response()
            }
            Self::RedirectHome => Redirect::to("/").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// The path (with query) the rejected request was trying to reach.
fn requested_path(parts: &Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string())
}

async fn current_user(parts: &Parts) -> Result<Option<CurrentUser>, AuthRejection> {
    // The session is set in extensions by SessionManagerLayer
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;

    Ok(session
        .get(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten())
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await?
            .ok_or_else(|| AuthRejection::RedirectToLogin {
                next: requested_path(parts),
            })?;
        Ok(Self(user))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await?
            .ok_or_else(|| AuthRejection::RedirectToLogin {
                next: requested_path(parts),
            })?;
        if !user.is_admin {
            return Err(AuthRejection::RedirectHome);
        }
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request when nobody is
/// signed in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Helper to set the current user in the session (login).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

/// Drop both identity and cart, used when the API reports the token expired.
///
/// Deliberately quiet about failures: the caller is already on an error path
/// redirecting to login, and a half-cleared session gets cleaned up on the
/// next request anyway.
pub async fn expire_session(session: &Session) {
    let _ = session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await;
    let _ = session.remove::<Cart>(session_keys::CART).await;
}
