//! # shopfront-core: Pure Pricing and Order Logic for Shopfront
//!
//! This crate holds every rule of the order pipeline as pure functions with
//! zero I/O dependencies. Persistence lives in `shopfront-db`, invoice
//! delivery in `shopfront-notify`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Shopfront Order Pipeline                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/storefront                              │   │
//! │  │    CartStore ──► CheckoutSession ──► OrderService              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ shopfront-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ │   │
//! │  │  │  money  │ │ discount │ │ pricing │ │  cart   │ │  order   │ │   │
//! │  │  │  Money  │ │ resolver │ │  Quote  │ │  Cart   │ │  state   │ │   │
//! │  │  └─────────┘ └──────────┘ └─────────┘ └─────────┘ │ machine  │ │   │
//! │  │  ┌─────────┐ ┌──────────┐ ┌─────────────┐         └──────────┘ │   │
//! │  │  │  types  │ │ checkout │ │ validation  │                      │   │
//! │  │  └─────────┘ └──────────┘ └─────────────┘                      │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK READS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          shopfront-db / shopfront-notify                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, Coupon, ShippingMethod, rates, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`discount`] - Per-product discount resolution
//! - [`pricing`] - Tax-inclusive subtotal/tax split, coupons, quotes
//! - [`cart`] - In-memory cart math
//! - [`order`] - Order state machine and payment/proof guards
//! - [`checkout`] - Checkout draft builder and validation
//! - [`validation`] - Field-level validators
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use shopfront_core::money::Money;
//! use shopfront_core::pricing::PricingEngine;
//! use shopfront_core::types::TaxRate;
//!
//! // 119.00 tax-inclusive at 19%
//! let engine = PricingEngine::new(TaxRate::from_bps(1900));
//! let quote = engine.quote(Money::from_cents(11900), Money::zero(), None);
//!
//! assert_eq!(quote.subtotal.cents(), 10000);
//! assert_eq!(quote.tax.cents(), 1900);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod discount;
pub mod error;
pub mod money;
pub mod order;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, CouponRejection, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tax rate used when no usable rate is configured (19%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1900;

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in the cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum unit price accepted into a cart (10,000,000.00).
///
/// Keeps `MAX_CART_ITEMS * MAX_ITEM_QUANTITY * MAX_PRICE_CENTS` well inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;
