//! # Pricing Engine
//!
//! Turns a tax-inclusive items total into the amounts stored on an order.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  T = Σ unit_price × qty        (tax-inclusive items total)             │
//! │  S = shipping cost                                                     │
//! │                                                                         │
//! │  subtotal = round(T × 10000 / (10000 + rate_bps))                      │
//! │  tax      = T − subtotal                                               │
//! │                                                                         │
//! │  coupon base = T + S                                                   │
//! │  discount    = round(base × coupon_bps / 10000)   (percentage)         │
//! │              = value                              (fixed)              │
//! │                                                                         │
//! │  total = max(T + S − discount, 0)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The coupon base is computed in exactly one place,
//! [`CouponRule::discount_for`]. Checkout preview and checkout commit both go
//! through [`PricingEngine::quote`], so they can never disagree.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{round_div, Money};
use crate::types::{Percentage, TaxRate};

// =============================================================================
// Tax Split
// =============================================================================

/// Splits a tax-inclusive amount into `(subtotal, tax)`.
///
/// `subtotal + tax == amount` holds exactly for every input.
///
/// ## Example
/// ```rust
/// use shopfront_core::money::Money;
/// use shopfront_core::pricing::split_tax_inclusive;
/// use shopfront_core::types::TaxRate;
///
/// let (subtotal, tax) = split_tax_inclusive(Money::from_cents(11900), TaxRate::from_bps(1900));
/// assert_eq!(subtotal.cents(), 10000);
/// assert_eq!(tax.cents(), 1900);
/// ```
pub fn split_tax_inclusive(amount: Money, rate: TaxRate) -> (Money, Money) {
    let subtotal = Money::from_cents(round_div(
        amount.cents() as i128 * 10_000,
        10_000 + rate.bps() as i128,
    ));
    (subtotal, amount - subtotal)
}

// =============================================================================
// Coupon Rule
// =============================================================================

/// How a coupon reduces an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CouponRule {
    Percentage(Percentage),
    Fixed(Money),
}

impl CouponRule {
    /// Discount granted on an order with items total `items_total` and
    /// shipping `shipping`.
    ///
    /// Percentage coupons apply to `items_total + shipping`. Fixed coupons
    /// grant their value verbatim, even when it exceeds the order; the
    /// total is clamped later.
    pub fn discount_for(&self, items_total: Money, shipping: Money) -> Money {
        match self {
            CouponRule::Percentage(pct) => (items_total + shipping).percentage_of(*pct),
            CouponRule::Fixed(amount) => *amount,
        }
    }
}

// =============================================================================
// Quote
// =============================================================================

/// Every amount shown at checkout and frozen onto the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quote {
    /// T: tax-inclusive sum of cart lines.
    pub items_total: Money,
    pub subtotal: Money,
    pub tax: Money,
    /// S
    pub shipping: Money,
    pub discount: Money,
    pub total: Money,
}

// =============================================================================
// Pricing Engine
// =============================================================================

/// Pure pricing computation for a single tax rate.
#[derive(Debug, Clone, Copy)]
pub struct PricingEngine {
    rate: TaxRate,
}

impl PricingEngine {
    pub const fn new(rate: TaxRate) -> Self {
        Self { rate }
    }

    pub const fn rate(&self) -> TaxRate {
        self.rate
    }

    /// Prices an order.
    ///
    /// ## Guarantees
    /// - `subtotal + tax == items_total`
    /// - `total >= 0`
    /// - `total` never decreases when `shipping` grows (fixed coupons) and
    ///   never increases when the discount grows
    pub fn quote(&self, items_total: Money, shipping: Money, coupon: Option<&CouponRule>) -> Quote {
        let (subtotal, tax) = split_tax_inclusive(items_total, self.rate);
        let discount = coupon
            .map(|rule| rule.discount_for(items_total, shipping))
            .unwrap_or_default();
        let total = (items_total + shipping - discount).clamp_non_negative();

        Quote {
            items_total,
            subtotal,
            tax,
            shipping,
            discount,
            total,
        }
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(TaxRate::default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    #[test]
    fn test_split_scenario() {
        let (subtotal, tax) = split_tax_inclusive(cents(11900), TaxRate::from_bps(1900));
        assert_eq!(subtotal, cents(10000));
        assert_eq!(tax, cents(1900));
    }

    #[test]
    fn test_split_always_sums_back() {
        for bps in [1, 500, 825, 1900, 2100, 10_000] {
            for t in (0..50_000).step_by(997) {
                let (subtotal, tax) = split_tax_inclusive(cents(t), TaxRate::from_bps(bps));
                assert_eq!(subtotal + tax, cents(t), "T={t} bps={bps}");
                assert!(!tax.is_negative(), "T={t} bps={bps}");
            }
        }
    }

    #[test]
    fn test_percentage_coupon_over_items_and_shipping() {
        let engine = PricingEngine::new(TaxRate::from_bps(1900));
        let coupon = CouponRule::Percentage(Percentage::from_bps(1000));

        let quote = engine.quote(cents(11900), cents(1000), Some(&coupon));

        assert_eq!(quote.discount, cents(1290));
        assert_eq!(quote.total, cents(11610));
        assert_eq!(quote.subtotal, cents(10000));
        assert_eq!(quote.tax, cents(1900));
    }

    #[test]
    fn test_fixed_coupon_and_clamp() {
        let engine = PricingEngine::default();

        let quote = engine.quote(cents(2000), cents(500), Some(&CouponRule::Fixed(cents(700))));
        assert_eq!(quote.discount, cents(700));
        assert_eq!(quote.total, cents(1800));

        let huge = engine.quote(cents(2000), cents(500), Some(&CouponRule::Fixed(cents(9999))));
        assert_eq!(huge.total, Money::zero());
    }

    #[test]
    fn test_total_matches_formula() {
        let engine = PricingEngine::default();
        for t in [0, 1, 999, 11900] {
            for s in [0, 450, 1000] {
                for d in [0, 100, 20_000] {
                    let quote = engine.quote(cents(t), cents(s), Some(&CouponRule::Fixed(cents(d))));
                    assert_eq!(quote.total.cents(), (t + s - d).max(0));
                }
            }
        }
    }

    #[test]
    fn test_total_monotonic_in_shipping() {
        let engine = PricingEngine::default();
        let coupon = CouponRule::Percentage(Percentage::from_bps(2500));
        let mut previous = Money::zero();
        for s in (0..5000).step_by(250) {
            let quote = engine.quote(cents(8000), cents(s), Some(&coupon));
            assert!(quote.total >= previous);
            previous = quote.total;
        }
    }

    #[test]
    fn test_no_coupon() {
        let quote = PricingEngine::default().quote(cents(11900), cents(1000), None);
        assert_eq!(quote.discount, Money::zero());
        assert_eq!(quote.total, cents(12900));
    }
}
