//! # Checkout
//!
//! The pure half of checkout: a draft the form writes into synchronously,
//! the frozen request it produces, validation, commit-time repricing, and
//! assembly of the order rows.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  form fields ──► CheckoutDraft::set_*  (version += 1 on every write)   │
//! │                        │                                                │
//! │                        ▼  freeze()                                      │
//! │                  CheckoutRequest { version, ... }                      │
//! │                        │                                                │
//! │                        ▼  validate(cart)    no writes on failure        │
//! │                        │                                                │
//! │                        ▼  reprice(lines, discounts, now)                │
//! │                        │                                                │
//! │                        ▼  build_order(...)                              │
//! │                  (Order, Vec<OrderItem>) ──► shopfront-db              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::{Cart, CartLine};
use crate::discount::active_percentage_for;
use crate::error::ValidationError;
use crate::pricing::Quote;
use crate::types::{
    Address, Coupon, CustomerDetails, CustomerProfile, Order, OrderItem, OrderStatus,
    PaymentMethod, ProductDiscount, ShippingMethod,
};
use crate::validation::{is_blank, normalize_coupon_code, validate_email, validate_required};

// =============================================================================
// Draft
// =============================================================================

/// Mutable checkout form state.
///
/// Each setter is a synchronous write; `version` counts them so a frozen
/// request can tell which edits it includes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutDraft {
    user_id: Option<String>,
    customer: CustomerDetails,
    address: Address,
    shipping_method_id: Option<String>,
    coupon_code: Option<String>,
    payment_method: PaymentMethod,
    version: u64,
}

impl CheckoutDraft {
    /// Empty draft for a guest buyer.
    pub fn guest() -> Self {
        Self::default()
    }

    /// Draft for an authenticated buyer, prefilled from their stored
    /// profile when there is one.
    pub fn for_user(user_id: impl Into<String>, profile: Option<&CustomerProfile>) -> Self {
        let mut draft = Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        };
        if let Some(profile) = profile {
            draft.customer = profile.customer.clone();
            draft.address = profile.address.clone();
        }
        draft
    }

    pub fn set_customer(&mut self, customer: CustomerDetails) {
        self.customer = customer;
        self.bump();
    }

    pub fn set_address(&mut self, address: Address) {
        self.address = address;
        self.bump();
    }

    pub fn select_shipping(&mut self, shipping_method_id: impl Into<String>) {
        self.shipping_method_id = Some(shipping_method_id.into());
        self.bump();
    }

    /// Stores a coupon code; blank input clears it.
    pub fn apply_coupon_code(&mut self, code: &str) {
        self.coupon_code = normalize_coupon_code(code).ok();
        self.bump();
    }

    pub fn clear_coupon(&mut self) {
        self.coupon_code = None;
        self.bump();
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
        self.bump();
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn customer(&self) -> &CustomerDetails {
        &self.customer
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn shipping_method_id(&self) -> Option<&str> {
        self.shipping_method_id.as_deref()
    }

    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Snapshot of every edit made so far.
    pub fn freeze(&self) -> CheckoutRequest {
        CheckoutRequest {
            user_id: self.user_id.clone(),
            customer: self.customer.clone(),
            address: self.address.clone(),
            shipping_method_id: self.shipping_method_id.clone(),
            coupon_code: self.coupon_code.clone(),
            payment_method: self.payment_method,
            version: self.version,
        }
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}

// =============================================================================
// Request
// =============================================================================

/// Immutable checkout input, produced by [`CheckoutDraft::freeze`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    pub user_id: Option<String>,
    pub customer: CustomerDetails,
    pub address: Address,
    pub shipping_method_id: Option<String>,
    pub coupon_code: Option<String>,
    pub payment_method: PaymentMethod,
    /// Draft version this request was frozen at.
    pub version: u64,
}

impl CheckoutRequest {
    /// Checks everything that can be checked without the database.
    ///
    /// ## Errors
    /// - `EmptyCart` when there is nothing to order
    /// - `Incomplete` listing every missing customer, address, or shipping
    ///   field
    /// - field errors for a malformed email or over-long values
    pub fn validate(&self, cart: &Cart) -> Result<(), ValidationError> {
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart);
        }

        let required = [
            ("name", self.customer.name.as_str()),
            ("surname", self.customer.surname.as_str()),
            ("email", self.customer.email.as_str()),
            ("street", self.address.street.as_str()),
            ("city", self.address.city.as_str()),
            ("postal_code", self.address.postal_code.as_str()),
            ("country", self.address.country.as_str()),
            (
                "shipping_method",
                self.shipping_method_id.as_deref().unwrap_or_default(),
            ),
        ];
        let missing: Vec<String> = required
            .iter()
            .filter(|(_, value)| is_blank(value))
            .map(|(field, _)| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::Incomplete { fields: missing });
        }

        validate_required("name", &self.customer.name, 100)?;
        validate_required("surname", &self.customer.surname, 100)?;
        validate_email(&self.customer.email)?;
        validate_required("street", &self.address.street, 200)?;
        validate_required("city", &self.address.city, 100)?;
        validate_required("postal_code", &self.address.postal_code, 20)?;
        validate_required("country", &self.address.country, 100)?;
        Ok(())
    }
}

// =============================================================================
// Commit-Time Repricing
// =============================================================================

/// A line whose unit price changed between the cart and commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceDrift {
    pub product_id: String,
    pub cart_price_cents: i64,
    pub commit_price_cents: i64,
}

/// Re-derives every unit price from its original price and the discount
/// active at `now`.
///
/// Returns the repriced lines and the lines whose price moved.
pub fn reprice(
    lines: &[CartLine],
    discounts: &[ProductDiscount],
    now: DateTime<Utc>,
) -> (Vec<CartLine>, Vec<PriceDrift>) {
    let mut drifts = Vec::new();
    let repriced = lines
        .iter()
        .map(|line| {
            let discount = active_percentage_for(discounts, &line.product_id, now);
            let unit = match discount {
                Some(pct) => line.original_price().discounted_by(pct),
                None => line.original_price(),
            };
            if unit.cents() != line.unit_price_cents {
                drifts.push(PriceDrift {
                    product_id: line.product_id.clone(),
                    cart_price_cents: line.unit_price_cents,
                    commit_price_cents: unit.cents(),
                });
            }
            CartLine {
                unit_price_cents: unit.cents(),
                discount,
                ..line.clone()
            }
        })
        .collect();
    (repriced, drifts)
}

// =============================================================================
// Order Assembly
// =============================================================================

/// Builds the order row and its item snapshots.
///
/// The order starts in `pending_payment` at version 1.
pub fn build_order(
    submission_key: &str,
    request: &CheckoutRequest,
    shipping: &ShippingMethod,
    coupon: Option<&Coupon>,
    lines: &[CartLine],
    quote: &Quote,
    now: DateTime<Utc>,
) -> (Order, Vec<OrderItem>) {
    let order_id = Uuid::new_v4().to_string();

    let order = Order {
        id: order_id.clone(),
        submission_key: submission_key.to_string(),
        user_id: request.user_id.clone(),
        customer: trimmed_customer(&request.customer),
        address: trimmed_address(&request.address),
        shipping_method_id: shipping.id.clone(),
        shipping_cost_cents: quote.shipping.cents(),
        coupon_id: coupon.map(|c| c.id.clone()),
        items_total_cents: quote.items_total.cents(),
        subtotal_cents: quote.subtotal.cents(),
        tax_cents: quote.tax.cents(),
        discount_cents: quote.discount.cents(),
        total_cents: quote.total.cents(),
        status: OrderStatus::PendingPayment,
        payment_method: request.payment_method,
        proof_url: None,
        version: 1,
        created_at: now,
        updated_at: now,
    };

    let items = lines
        .iter()
        .map(|line| OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.clone(),
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            unit_price_cents: line.unit_price_cents,
            original_price_cents: line.original_price_cents,
            quantity: line.quantity,
            line_total_cents: line.line_total().cents(),
            created_at: now,
        })
        .collect();

    (order, items)
}

fn trimmed_customer(c: &CustomerDetails) -> CustomerDetails {
    CustomerDetails {
        name: c.name.trim().to_string(),
        surname: c.surname.trim().to_string(),
        email: c.email.trim().to_string(),
        phone: c
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
    }
}

fn trimmed_address(a: &Address) -> Address {
    Address {
        street: a.street.trim().to_string(),
        city: a.city.trim().to_string(),
        postal_code: a.postal_code.trim().to_string(),
        country: a.country.trim().to_string(),
        region: a
            .region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
