//! # Error Types
//!
//! Domain-specific error types for shopfront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopfront-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── CouponRejection  - Why a coupon cannot be redeemed                │
//! │                                                                         │
//! │  shopfront-db errors      → DbError                                    │
//! │  shopfront-notify errors  → NotifyError                                │
//! │  storefront app           → ApiError (serialized for callers)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Caller                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Switching to cash was requested while a proof of payment is attached.
    ///
    /// ## User Workflow
    /// ```text
    /// Buyer uploaded transfer receipt (proof_url = "…/proof.png")
    ///      │
    ///      ▼
    /// Buyer clicks "Pay with cash"
    ///      │
    ///      ▼
    /// CashWithProof { order_id } ← no write attempted
    ///      │
    ///      ▼
    /// UI shows: "Remove the uploaded proof before paying with cash"
    /// ```
    #[error("Order {order_id} has a proof of payment; remove it before switching to cash")]
    CashWithProof { order_id: String },

    /// The coupon exists but cannot be applied right now.
    #[error("Coupon {code} cannot be applied: {reason}")]
    CouponRejected {
        code: String,
        reason: CouponRejection,
    },

    /// No coupon with this code exists.
    #[error("Unknown coupon code: {0}")]
    UnknownCoupon(String),

    /// The selected shipping method is missing or inactive.
    #[error("Shipping method {0} is not available")]
    ShippingMethodUnavailable(String),

    /// A status string could not be parsed.
    #[error("Unknown order status: {0}")]
    InvalidStatus(String),

    /// The operation needs an order state other than the current one.
    #[error("Order {order_id} is {current:?}, cannot perform operation")]
    InvalidOrderStatus {
        order_id: String,
        current: OrderStatus,
    },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Coupon Rejection
// =============================================================================

/// Reason a coupon is not redeemable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CouponRejection {
    Inactive,
    NotYetValid,
    Expired,
    GlobalLimitReached,
    PerUserLimitReached,
}

impl std::fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            CouponRejection::Inactive => "coupon is not active",
            CouponRejection::NotYetValid => "coupon is not valid yet",
            CouponRejection::Expired => "coupon has expired",
            CouponRejection::GlobalLimitReached => "coupon usage limit reached",
            CouponRejection::PerUserLimitReached => "coupon already used the maximum number of times",
        };
        f.write_str(msg)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write is attempted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Several required fields are missing at once (checkout form).
    #[error("missing required fields: {}", fields.join(", "))]
    Incomplete { fields: Vec<String> },

    /// Checkout was attempted with an empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
