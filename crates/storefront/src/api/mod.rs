//! Sweet shop REST API client.
//!
//! # Architecture
//!
//! - The remote API is the source of truth - NO local persistence, direct calls
//! - Typed request/response structs in [`types`], shared IDs from `sweet-shop-core`
//! - In-memory caching via `moka` for the catalog snapshot (configurable TTL)
//! - Authenticated calls carry `Authorization: Bearer <token>`; the header is
//!   only attached when a token is actually present
//!
//! # Example
//!
//! ```rust,ignore
//! use sweet_shop_storefront::api::ShopClient;
//!
//! let client = ShopClient::new(&config);
//!
//! // Browse the catalog (cached snapshot)
//! let sweets = client.catalog().await?;
//!
//! // Log in and place an order
//! let token = client.login("user@example.com", "hunter2-long").await?;
//! let order = client.place_order(&token.access_token, &request).await?;
//! ```

mod client;
pub mod types;

pub use client::ShopClient;
pub use types::*;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the sweet shop API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (transport-level; no usable response).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The server rejected the request with an error status.
    #[error("{message}")]
    Status {
        /// HTTP status returned by the server.
        status: StatusCode,
        /// Server-supplied reason (from the `detail` field) or a fallback.
        message: String,
    },

    /// Structured field-validation failure, flattened to one readable string.
    #[error("{message}")]
    Validation {
        /// Joined field messages, e.g. `password: too short`.
        message: String,
    },
}

impl ApiError {
    /// Build an error from a non-success response body.
    ///
    /// The API reports failures as `{"detail": "..."}` for business-rule and
    /// auth errors, and `{"detail": [{loc, msg, ...}]}` for field validation.
    /// Anything unrecognized falls back to a generic message with the status.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody {
                detail: Detail::Message(message),
            }) => Self::Status { status, message },
            Ok(ErrorBody {
                detail: Detail::Fields(errors),
            }) => Self::Validation {
                message: flatten_field_errors(&errors),
            },
            Err(_) => Self::Status {
                status,
                message: format!("The sweet shop service returned an error (HTTP {status})"),
            },
        }
    }

    /// True if the server rejected the credentials or token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Status {
                status: StatusCode::UNAUTHORIZED,
                ..
            }
        )
    }

    /// True if the requested entity does not exist (deleted or never created).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Status {
                status: StatusCode::NOT_FOUND,
                ..
            }
        )
    }

    /// The single human-readable string shown to the user.
    ///
    /// Transport failures get a generic message rather than a Rust error chain.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) => {
                "Could not reach the sweet shop service. Please try again.".to_string()
            }
            Self::Parse(_) => "The sweet shop service sent an unexpected response.".to_string(),
            Self::Status { message, .. } | Self::Validation { message } => message.clone(),
        }
    }
}

/// Error envelope used by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Detail,
}

/// The `detail` field is either a plain message or a validation error array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Detail {
    Message(String),
    Fields(Vec<FieldError>),
}

/// One structured field-validation error.
#[derive(Debug, Deserialize)]
struct FieldError {
    /// Location path, e.g. `["body", "password"]`.
    #[serde(default)]
    loc: Vec<serde_json::Value>,
    /// Human-readable message for this field.
    msg: String,
}

/// Flatten structured validation errors into one string.
///
/// `[{loc: ["body", "password"], msg: "too short"}]` becomes
/// `"password: too short"`; multiple errors are joined with `"; "`.
fn flatten_field_errors(errors: &[FieldError]) -> String {
    if errors.is_empty() {
        return "Validation failed".to_string();
    }

    errors
        .iter()
        .map(|e| {
            // The last path segment is the field name; earlier segments
            // ("body", indexes) are request plumbing.
            let field = e.loc.iter().rev().find_map(|v| match v {
                serde_json::Value::String(s) if s != "body" && s != "query" => Some(s.as_str()),
                _ => None,
            });
            field.map_or_else(|| e.msg.clone(), |f| format!("{f}: {}", e.msg))
        })
        .collect::<Vec<_>>()
        .join("; ")
}
