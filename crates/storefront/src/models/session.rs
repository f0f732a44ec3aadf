//! Session-held identity.

use serde::{Deserialize, Serialize};

use sweet_shop_core::{Email, UserId};

use crate::api::UserProfile;

/// Session storage keys.
pub mod session_keys {
    /// The signed-in identity ([`CurrentUser`]).
    pub const CURRENT_USER: &str = "current_user";
    /// The shopping cart ([`crate::models::Cart`]).
    pub const CART: &str = "cart";
}

/// The authenticated user stored in the session.
///
/// Holds the bearer token alongside the profile so that handlers can call the
/// API without a second lookup. The profile fields come from `/users/me` at
/// login time; the API re-checks the admin flag on every privileged call, so
/// a stale flag here can hide UI but never grant access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Option<Email>,
    pub is_admin: bool,
    token: String,
}

impl CurrentUser {
    /// Pair a verified profile with the token that produced it.
    #[must_use]
    pub fn new(profile: UserProfile, token: String) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            is_admin: profile.is_admin,
            token,
        }
    }

    /// Bearer token for API calls on this user's behalf.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Name to greet the user with: the email, or a numbered fallback.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.email
            .as_ref()
            .map_or_else(|| format!("user #{}", self.id), |e| e.as_str().to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_email() {
        let user = CurrentUser::new(
            UserProfile {
                id: UserId::new(7),
                email: Some("sam@example.com".parse().unwrap()),
                is_admin: false,
            },
            "tok".to_string(),
        );
        assert_eq!(user.display_name(), "sam@example.com");
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let user = CurrentUser::new(
            UserProfile {
                id: UserId::new(7),
                email: None,
                is_admin: true,
            },
            "tok".to_string(),
        );
        assert_eq!(user.display_name(), "user #7");
    }

    #[test]
    fn test_serde_round_trip_keeps_token() {
        let user = CurrentUser::new(
            UserProfile {
                id: UserId::new(1),
                email: None,
                is_admin: false,
            },
            "secret-token".to_string(),
        );
        let json = serde_json::to_string(&user).unwrap();
        let restored: CurrentUser = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.token(), "secret-token");
    }
}
