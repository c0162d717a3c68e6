//! # Cart
//!
//! The buyer's in-progress list of lines. Durable storage lives in the
//! storefront app (`CartStore`); this module is only the math.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add(product, +n)   ──► merge by product_id, quantity += n             │
//! │  add(product, −n)   ──► quantity −= n, line removed when ≤ 0           │
//! │  set_quantity(id,q) ──► quantity = q, line removed when ≤ 0            │
//! │  remove(id)         ──► line removed                                   │
//! │  clear()            ──► all lines removed                              │
//! │                                                                         │
//! │  total()        = Σ quantity            (item count, not currency)     │
//! │  items_total()  = Σ unit_price × qty    (T, tax-inclusive)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id`
//! - Every stored line has `1 <= quantity <= MAX_ITEM_QUANTITY`
//! - At most `MAX_CART_ITEMS` lines

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Percentage;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Product data the cart needs when a line is first added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartProduct {
    pub id: String,
    pub name: String,
    /// Tax-inclusive catalog price before any product discount.
    pub original_price_cents: i64,
    /// Discount active when the product was shown, if any.
    pub discount: Option<Percentage>,
}

impl CartProduct {
    /// Tax-inclusive price after the product discount.
    pub fn unit_price(&self) -> Money {
        let original = Money::from_cents(self.original_price_cents);
        match self.discount {
            Some(pct) => original.discounted_by(pct),
            None => original,
        }
    }
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    /// Tax-inclusive, post-discount.
    pub unit_price_cents: i64,
    pub original_price_cents: i64,
    pub discount: Option<Percentage>,
    pub quantity: i64,
}

impl CartLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn original_price(&self) -> Money {
        Money::from_cents(self.original_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` of `product`, merging into an existing line.
    ///
    /// A negative quantity decrements; a line whose quantity drops to zero
    /// or below is removed. Decrementing a product that is not in the cart
    /// is a no-op.
    ///
    /// The price of an existing line is kept; only the quantity changes.
    pub fn add(&mut self, product: &CartProduct, quantity: i64) -> CoreResult<()> {
        if let Some(index) = self.position(&product.id) {
            let new_qty = self.lines[index].quantity + quantity;
            return self.store_quantity(index, new_qty);
        }

        if quantity <= 0 {
            return Ok(());
        }
        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        self.lines.push(CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.unit_price().cents(),
            original_price_cents: product.original_price_cents,
            discount: product.discount,
            quantity,
        });
        Ok(())
    }

    /// Sets the quantity of an existing line. Returns `false` when the
    /// product is not in the cart.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<bool> {
        match self.position(product_id) {
            Some(index) => self.store_quantity(index, quantity).map(|_| true),
            None => Ok(false),
        }
    }

    /// Removes a line. Returns `false` when the product was not in the cart.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across all lines.
    pub fn total(&self) -> i64 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Tax-inclusive sum of line totals.
    pub fn items_total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    fn position(&self, product_id: &str) -> Option<usize> {
        self.lines.iter().position(|line| line.product_id == product_id)
    }

    fn store_quantity(&mut self, index: usize, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            self.lines.remove(index);
            return Ok(());
        }
        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        self.lines[index].quantity = quantity;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(id: &str, price_cents: i64) -> CartProduct {
        CartProduct {
            id: id.to_string(),
            name: format!("Product {}", id),
            original_price_cents: price_cents,
            discount: None,
        }
    }

    #[test]
    fn test_cart_add_item() {
        let mut cart = Cart::new();
        cart.add(&test_product("1", 999), 2).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total(), 2);
        assert_eq!(cart.items_total().cents(), 1998);
    }

    #[test]
    fn test_cart_add_same_product_merges() {
        let mut cart = Cart::new();
        let product = test_product("1", 999);

        cart.add(&product, 2).unwrap();
        cart.add(&product, 3).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total(), 5);
    }

    #[test]
    fn test_negative_add_decrements_then_removes() {
        let mut cart = Cart::new();
        let product = test_product("1", 500);

        cart.add(&product, 3).unwrap();
        cart.add(&product, -1).unwrap();
        assert_eq!(cart.total(), 2);

        cart.add(&product, -2).unwrap();
        assert!(cart.is_empty());

        // Nothing to decrement
        cart.add(&product, -1).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_discounted_unit_price_is_frozen_on_line() {
        let mut cart = Cart::new();
        let mut product = test_product("1", 5000);
        product.discount = Some(Percentage::from_bps(2000));

        cart.add(&product, 1).unwrap();
        let line = &cart.lines()[0];
        assert_eq!(line.unit_price_cents, 4000);
        assert_eq!(line.original_price_cents, 5000);

        // A later add with a different discount does not reprice the line
        product.discount = None;
        cart.add(&product, 1).unwrap();
        assert_eq!(cart.items_total().cents(), 8000);
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut cart = Cart::new();
        cart.add(&test_product("1", 100), 1).unwrap();
        cart.add(&test_product("2", 200), 1).unwrap();

        assert!(cart.set_quantity("1", 4).unwrap());
        assert_eq!(cart.total(), 5);

        assert!(cart.set_quantity("1", 0).unwrap());
        assert_eq!(cart.lines().len(), 1);

        assert!(!cart.set_quantity("missing", 2).unwrap());
        assert!(cart.remove("2"));
        assert!(!cart.remove("2"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_limit() {
        let mut cart = Cart::new();
        let product = test_product("1", 100);

        assert!(matches!(
            cart.add(&product, MAX_ITEM_QUANTITY + 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));

        cart.add(&product, MAX_ITEM_QUANTITY).unwrap();
        assert!(cart.add(&product, 1).is_err());
        assert_eq!(cart.total(), MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_line_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add(&test_product(&i.to_string(), 100), 1).unwrap();
        }
        assert!(matches!(
            cart.add(&test_product("overflow", 100), 1),
            Err(CoreError::CartTooLarge { .. })
        ));
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(&test_product("1", 999), 2).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.items_total(), Money::zero());
    }
}
