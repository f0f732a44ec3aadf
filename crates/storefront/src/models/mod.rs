//! Session-scoped domain models: the cart and the signed-in user.

pub mod cart;
pub mod session;

pub use cart::{Cart, CartError, CartLine};
pub use session::{CurrentUser, session_keys};
