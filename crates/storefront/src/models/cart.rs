//! Session-held shopping cart.
//!
//! The cart is pure state plus guard logic: it never talks to the network.
//! Stock checks run against the catalog snapshot the caller passes in, and
//! every rejected operation leaves the cart exactly as it was.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sweet_shop_core::{Price, SweetId};

use crate::api::{OrderItemRequest, OrderRequest, Sweet};

/// Why an add was rejected. The cart is unchanged in both cases.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The product has zero stock and no line exists for it yet.
    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    /// Adding one more would exceed the known stock level.
    #[error("Only {available} of {name} available")]
    InsufficientStock { name: String, available: u32 },
}

/// One product line in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub sweet_id: SweetId,
    pub name: String,
    /// Unit price captured when the line was first added.
    pub price_at_add: Price,
    pub quantity: u32,
}

impl CartLine {
    /// Line subtotal: captured unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.price_at_add.times(self.quantity)
    }
}

/// The cart itself: an ordered list of lines, at most one per product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Add one unit of a sweet, guarded by the given stock snapshot.
    ///
    /// A repeat add increments the existing line's quantity rather than
    /// creating a second line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfStock`] when the product has zero stock and
    /// no line yet, or [`CartError::InsufficientStock`] when the candidate
    /// quantity would exceed `stock_quantity`. The cart is untouched on error.
    pub fn add(&mut self, sweet: &Sweet) -> Result<(), CartError> {
        let current = self
            .lines
            .iter()
            .find(|l| l.sweet_id == sweet.id)
            .map_or(0, |l| l.quantity);

        if current == 0 && sweet.stock_quantity == 0 {
            return Err(CartError::OutOfStock {
                name: sweet.name.clone(),
            });
        }

        let candidate = current + 1;
        if candidate > sweet.stock_quantity {
            return Err(CartError::InsufficientStock {
                name: sweet.name.clone(),
                available: sweet.stock_quantity,
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.sweet_id == sweet.id) {
            line.quantity = candidate;
        } else {
            self.lines.push(CartLine {
                sweet_id: sweet.id,
                name: sweet.name.clone(),
                price_at_add: sweet.price,
                quantity: 1,
            });
        }
        Ok(())
    }

    /// Shift a line's quantity by a signed delta.
    ///
    /// Dropping to zero or below removes the line. Unknown product IDs are a
    /// no-op. Increases are not stock-guarded here; the add path is the only
    /// guarded entry point and the server re-validates at checkout.
    pub fn adjust_quantity(&mut self, sweet_id: SweetId, delta: i64) {
        let Some(line) = self.lines.iter_mut().find(|l| l.sweet_id == sweet_id) else {
            return;
        };

        let next = i64::from(line.quantity).saturating_add(delta);
        if next <= 0 {
            self.lines.retain(|l| l.sweet_id != sweet_id);
        } else {
            line.quantity = u32::try_from(next).unwrap_or(u32::MAX);
        }
    }

    /// Remove a line entirely, regardless of quantity.
    pub fn remove(&mut self, sweet_id: SweetId) {
        self.lines.retain(|l| l.sweet_id != sweet_id);
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of line subtotals at captured prices. Zero for an empty cart.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Number of distinct product lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Build the order request body: product IDs and quantities only.
    ///
    /// Captured prices stay out of the payload; the server prices the order
    /// from its own catalog state.
    #[must_use]
    pub fn order_request(&self) -> OrderRequest {
        OrderRequest {
            items: self
                .lines
                .iter()
                .map(|l| OrderItemRequest {
                    sweet_id: l.sweet_id,
                    quantity: l.quantity,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sweet(id: i32, name: &str, price: &str, stock: u32) -> Sweet {
        Sweet {
            id: SweetId::new(id),
            name: name.to_string(),
            description: None,
            category: "Test".to_string(),
            price: price.parse().unwrap(),
            stock_quantity: stock,
            is_available: true,
        }
    }

    #[test]
    fn test_add_up_to_stock_succeeds() {
        let ladoo = sweet(1, "Ladoo", "2.00", 3);
        let mut cart = Cart::default();
        for _ in 0..3 {
            cart.add(&ladoo).unwrap();
        }
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn test_add_beyond_stock_rejected_and_cart_untouched() {
        let ladoo = sweet(1, "Ladoo", "2.00", 3);
        let mut cart = Cart::default();
        for _ in 0..3 {
            cart.add(&ladoo).unwrap();
        }
        let total_before = cart.total();

        let err = cart.add(&ladoo).unwrap_err();
        assert_eq!(
            err,
            CartError::InsufficientStock {
                name: "Ladoo".to_string(),
                available: 3,
            }
        );
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.total(), total_before);
    }

    #[test]
    fn test_add_out_of_stock_rejected() {
        let gone = sweet(1, "Barfi", "3.00", 0);
        let mut cart = Cart::default();
        let err = cart.add(&gone).unwrap_err();
        assert_eq!(
            err,
            CartError::OutOfStock {
                name: "Barfi".to_string(),
            }
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_repeat_add_increments_single_line() {
        let ladoo = sweet(1, "Ladoo", "2.00", 10);
        let mut cart = Cart::default();
        cart.add(&ladoo).unwrap();
        cart.add(&ladoo).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.unit_count(), 2);
    }

    #[test]
    fn test_adjust_to_zero_removes_line() {
        let ladoo = sweet(1, "Ladoo", "2.00", 10);
        let mut cart = Cart::default();
        cart.add(&ladoo).unwrap();
        cart.add(&ladoo).unwrap();

        cart.adjust_quantity(ladoo.id, -2);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_adjust_below_zero_removes_line() {
        let ladoo = sweet(1, "Ladoo", "2.00", 10);
        let mut cart = Cart::default();
        cart.add(&ladoo).unwrap();

        cart.adjust_quantity(ladoo.id, -5);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_adjust_unknown_id_is_noop() {
        let ladoo = sweet(1, "Ladoo", "2.00", 10);
        let mut cart = Cart::default();
        cart.add(&ladoo).unwrap();

        cart.adjust_quantity(SweetId::new(99), -1);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_remove_deletes_whole_line() {
        let ladoo = sweet(1, "Ladoo", "2.00", 10);
        let barfi = sweet(2, "Barfi", "3.00", 10);
        let mut cart = Cart::default();
        cart.add(&ladoo).unwrap();
        cart.add(&ladoo).unwrap();
        cart.add(&barfi).unwrap();

        cart.remove(ladoo.id);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].sweet_id, barfi.id);
    }

    #[test]
    fn test_total_two_products() {
        let a = sweet(1, "A", "10.00", 10);
        let b = sweet(2, "B", "5.00", 10);
        let mut cart = Cart::default();
        cart.add(&a).unwrap();
        cart.add(&a).unwrap();
        cart.add(&b).unwrap();

        assert_eq!(cart.total().to_string(), "$25.00");
    }

    #[test]
    fn test_empty_cart_total_is_zero() {
        let cart = Cart::default();
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_price_captured_at_add() {
        let mut ladoo = sweet(1, "Ladoo", "2.00", 10);
        let mut cart = Cart::default();
        cart.add(&ladoo).unwrap();

        // A later catalog price change does not reprice the existing line
        ladoo.price = "9.99".parse().unwrap();
        cart.add(&ladoo).unwrap();
        assert_eq!(cart.total().to_string(), "$4.00");
    }

    #[test]
    fn test_clear_empties_cart() {
        let ladoo = sweet(1, "Ladoo", "2.00", 10);
        let mut cart = Cart::default();
        cart.add(&ladoo).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_order_request_mirrors_lines() {
        let a = sweet(1, "A", "10.00", 10);
        let b = sweet(2, "B", "5.00", 10);
        let mut cart = Cart::default();
        cart.add(&a).unwrap();
        cart.add(&a).unwrap();
        cart.add(&b).unwrap();

        let request = cart.order_request();
        assert_eq!(request.items.len(), 2);
        assert_eq!(request.items[0].sweet_id, a.id);
        assert_eq!(request.items[0].quantity, 2);
        assert_eq!(request.items[1].quantity, 1);
    }

    #[test]
    fn test_cart_survives_serde_round_trip() {
        let ladoo = sweet(1, "Ladoo", "2.50", 10);
        let mut cart = Cart::default();
        cart.add(&ladoo).unwrap();
        cart.add(&ladoo).unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.lines(), cart.lines());
        assert_eq!(restored.total().to_string(), "$5.00");
    }
}
