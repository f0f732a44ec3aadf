//! Sweet Shop Core - Shared types library.
//!
//! This crate provides common types used across the sweet shop components:
//! - `storefront` - Customer-facing shop and admin back-office
//! - `integration-tests` - End-to-end tests against a mock API
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Everything
//! here mirrors what the remote sweet shop API owns; the client never invents
//! identifiers or statuses of its own.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
