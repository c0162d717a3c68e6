//! # Discount Resolution
//!
//! Picks the single promotional markdown that applies to a product.
//!
//! ```text
//! discounts for product ──► filter(active ∧ now ∈ window) ──► max percentage
//!                                                              (first wins on ties)
//! ```
//!
//! The caller passes `now`; the result must not be cached across calls
//! because window membership depends on the clock.

use chrono::{DateTime, Utc};

use crate::money::Money;
use crate::types::{Percentage, ProductDiscount};

/// Returns the discount that applies to `product_id` at `now`, if any.
///
/// Rows for other products are ignored. Among matches the highest
/// percentage wins; on equal percentages the earliest row in `discounts`
/// is kept.
pub fn active_discount_for<'a>(
    discounts: &'a [ProductDiscount],
    product_id: &str,
    now: DateTime<Utc>,
) -> Option<&'a ProductDiscount> {
    discounts
        .iter()
        .filter(|d| d.product_id == product_id && d.applies_at(now))
        .fold(None, |best: Option<&ProductDiscount>, candidate| match best {
            Some(current) if current.percentage() >= candidate.percentage() => Some(current),
            _ => Some(candidate),
        })
}

/// Percentage form of [`active_discount_for`].
pub fn active_percentage_for(
    discounts: &[ProductDiscount],
    product_id: &str,
    now: DateTime<Utc>,
) -> Option<Percentage> {
    active_discount_for(discounts, product_id, now).map(ProductDiscount::percentage)
}

/// Unit price after applying whatever discount is active at `now`.
pub fn effective_unit_price(
    original: Money,
    discounts: &[ProductDiscount],
    product_id: &str,
    now: DateTime<Utc>,
) -> Money {
    match active_percentage_for(discounts, product_id, now) {
        Some(pct) => original.discounted_by(pct),
        None => original,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn discount(id: &str, bps: i64) -> ProductDiscount {
        ProductDiscount {
            id: id.to_string(),
            product_id: "prod-1".to_string(),
            percentage_bps: bps,
            is_active: true,
            window_start: None,
            window_end: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_highest_percentage_wins() {
        let now = Utc::now();
        let discounts = vec![discount("ten", 1000), discount("twenty", 2000)];

        assert_eq!(
            active_percentage_for(&discounts, "prod-1", now),
            Some(Percentage::from_bps(2000))
        );
    }

    #[test]
    fn test_tie_keeps_first() {
        let now = Utc::now();
        let discounts = vec![discount("first", 1500), discount("second", 1500)];

        let winner = active_discount_for(&discounts, "prod-1", now).unwrap();
        assert_eq!(winner.id, "first");
    }

    #[test]
    fn test_window_and_flag_filtering() {
        let now = Utc::now();
        let mut expired = discount("expired", 5000);
        expired.window_end = Some(now - Duration::minutes(1));
        let mut upcoming = discount("upcoming", 4000);
        upcoming.window_start = Some(now + Duration::minutes(1));
        let mut disabled = discount("disabled", 3000);
        disabled.is_active = false;
        let running = discount("running", 1000);

        let discounts = vec![expired, upcoming, disabled, running];
        let winner = active_discount_for(&discounts, "prod-1", now).unwrap();
        assert_eq!(winner.id, "running");
    }

    #[test]
    fn test_none_when_nothing_matches() {
        let now = Utc::now();
        assert!(active_discount_for(&[], "prod-1", now).is_none());

        let discounts = vec![discount("other", 1000)];
        assert!(active_discount_for(&discounts, "prod-2", now).is_none());
    }

    #[test]
    fn test_effective_unit_price() {
        let now = Utc::now();
        let discounts = vec![discount("twenty", 2000)];

        let price = effective_unit_price(Money::from_cents(5000), &discounts, "prod-1", now);
        assert_eq!(price.cents(), 4000);

        let untouched = effective_unit_price(Money::from_cents(5000), &discounts, "prod-9", now);
        assert_eq!(untouched.cents(), 5000);
    }
}
