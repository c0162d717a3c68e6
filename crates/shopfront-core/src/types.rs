//! # Domain Types
//!
//! Core domain types used throughout Shopfront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │   OrderItem     │   │ InvoiceOutbox   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │     Entry       │       │
//! │  │  id (UUID)      │──►│  order_id (FK)  │   │  order_id (FK)  │       │
//! │  │  submission_key │   │  name snapshot  │   │  attempts       │       │
//! │  │  status         │   │  unit price     │   └─────────────────┘       │
//! │  │  total_cents    │   │  quantity       │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Coupon      │   │ ProductDiscount │   │ ShippingMethod  │       │
//! │  │  percentage |   │   │  percentage     │   │  cost_cents     │       │
//! │  │  fixed          │   │  time window    │   │  is_active      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │  OrderStatus    │   │ PaymentMethod   │       │
//! │  │  bps (u32)      │   │  PendingPayment │   │  Cash           │       │
//! │  │  1900 = 19%     │   │  InReview, Paid │   │  Transfer       │       │
//! │  └─────────────────┘   │  Shipped, ...   │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row types derive `sqlx::FromRow` when the `sqlx` feature is on, so
//! shopfront-db can read them straight out of queries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CouponRejection};
use crate::money::Money;
use crate::pricing::CouponRule;

// =============================================================================
// Rates
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1900 bps = 19%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// A usable rate is strictly positive and at most 100%.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 > 0 && self.0 <= 10_000
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::DEFAULT_TAX_RATE_BPS)
    }
}

/// A percentage in basis points, used for product discounts and coupons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Converts a stored integer, clamping to 0..=100%.
    #[inline]
    pub fn from_stored(bps: i64) -> Self {
        Percentage(bps.clamp(0, 10_000) as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle state of an order.
///
/// ```text
/// pending_payment ──► in_review ──► paid ──► shipped ──► finalized
///        │                │           │          │
///        └────────────────┴───────────┴──────────┴──────► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created by checkout, waiting for the buyer to pay.
    PendingPayment,
    /// Proof of payment uploaded, waiting for an administrator.
    InReview,
    Paid,
    Shipped,
    Finalized,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::PendingPayment,
        OrderStatus::InReview,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Finalized,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::InReview => "in_review",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Finalized => "finalized",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Finalized and cancelled orders accept no further buyer action.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Finalized | OrderStatus::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::PendingPayment
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('-', "_");
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == needle)
            .ok_or_else(|| CoreError::InvalidStatus(s.to_string()))
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Paid in cash on delivery or pickup.
    Cash,
    /// Bank transfer, evidenced by an uploaded proof.
    Transfer,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Transfer
    }
}

// =============================================================================
// Product Discount
// =============================================================================

/// A time-windowed percentage markdown on one product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductDiscount {
    pub id: String,
    pub product_id: String,
    /// Markdown in basis points (2000 = 20%).
    pub percentage_bps: i64,
    pub is_active: bool,
    /// Open bound when `None`.
    #[ts(as = "Option<String>")]
    pub window_start: Option<DateTime<Utc>>,
    /// Open bound when `None`.
    #[ts(as = "Option<String>")]
    pub window_end: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ProductDiscount {
    #[inline]
    pub fn percentage(&self) -> Percentage {
        Percentage::from_stored(self.percentage_bps)
    }

    /// Active flag set, positive percentage, and `now` inside the window.
    pub fn applies_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.percentage_bps > 0
            && self.window_start.map_or(true, |start| start <= now)
            && self.window_end.map_or(true, |end| end >= now)
    }
}

// =============================================================================
// Coupon
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    /// `value` is basis points of the coupon base.
    Percentage,
    /// `value` is an amount in cents.
    Fixed,
}

/// An order-level discount code.
///
/// Never mutated by the order flow; usage is counted from the orders that
/// reference it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Coupon {
    pub id: String,
    pub code: String,
    pub discount_type: CouponType,
    pub value: i64,
    #[ts(as = "Option<String>")]
    pub valid_from: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub valid_to: Option<DateTime<Utc>>,
    pub max_uses_global: Option<i64>,
    pub max_uses_per_user: Option<i64>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// The pricing rule this coupon applies.
    pub fn rule(&self) -> CouponRule {
        match self.discount_type {
            CouponType::Percentage => CouponRule::Percentage(Percentage::from_stored(self.value)),
            CouponType::Fixed => CouponRule::Fixed(Money::from_cents(self.value.max(0))),
        }
    }

    /// Checks whether the coupon can be redeemed at `now`.
    ///
    /// ## Arguments
    /// * `global_uses` - orders already referencing this coupon
    /// * `user_uses` - orders by the current buyer referencing it (0 for guests)
    pub fn is_redeemable(
        &self,
        now: DateTime<Utc>,
        global_uses: i64,
        user_uses: i64,
    ) -> Result<(), CouponRejection> {
        if !self.is_active {
            return Err(CouponRejection::Inactive);
        }
        if self.valid_from.is_some_and(|from| now < from) {
            return Err(CouponRejection::NotYetValid);
        }
        if self.valid_to.is_some_and(|to| now > to) {
            return Err(CouponRejection::Expired);
        }
        if self.max_uses_global.is_some_and(|max| global_uses >= max) {
            return Err(CouponRejection::GlobalLimitReached);
        }
        if self.max_uses_per_user.is_some_and(|max| user_uses >= max) {
            return Err(CouponRejection::PerUserLimitReached);
        }
        Ok(())
    }
}

// =============================================================================
// Shipping Method
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ShippingMethod {
    pub id: String,
    pub code: String,
    pub name: String,
    pub cost_cents: i64,
    pub is_active: bool,
}

impl ShippingMethod {
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Buyer identity as entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CustomerDetails {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Shipping address as entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub region: Option<String>,
}

/// Stored profile of an authenticated buyer, used to prefill checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CustomerProfile {
    pub user_id: String,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub customer: CustomerDetails,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub address: Address,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// A placed order.
///
/// Every amount is a snapshot taken at checkout; nothing here is ever
/// recomputed from live catalog prices.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// One per checkout session; UNIQUE in the database.
    pub submission_key: String,
    /// `None` for guest checkouts.
    pub user_id: Option<String>,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub customer: CustomerDetails,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub address: Address,
    pub shipping_method_id: String,
    pub shipping_cost_cents: i64,
    pub coupon_id: Option<String>,
    /// Tax-inclusive sum of line totals (T).
    pub items_total_cents: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub proof_url: Option<String>,
    /// Bumped on every persisted transition.
    pub version: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A frozen line of an order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at time of checkout (frozen).
    pub name: String,
    /// Tax-inclusive unit price actually charged (frozen).
    pub unit_price_cents: i64,
    /// Catalog price before any product discount (frozen).
    pub original_price_cents: i64,
    pub quantity: i64,
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Invoice Outbox
// =============================================================================

/// A pending invoice notification, written in the same transaction as the
/// transition into `paid`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceOutboxEntry {
    pub id: String,
    pub order_id: String,
    /// Proof of payment URL forwarded as the invoice attachment.
    pub attachment: Option<String>,
    pub attempts: i64,
    pub last_error: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub attempted_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub sent_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================
