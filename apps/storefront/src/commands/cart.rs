//! # Cart Commands
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Checkout │────►│  Order   │       │
//! │  │  Cart    │     │          │     │ Session  │     │ pending  │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                                 │              │
//! │                   add_to_cart                     cart cleared          │
//! │                   update_cart_item                after commit          │
//! │                   remove_from_cart                                      │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────► (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices shown here use the product discount active right now. Checkout
//! re-derives them at commit time.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use shopfront_core::cart::{Cart, CartLine, CartProduct};
use shopfront_core::discount::active_percentage_for;
use shopfront_core::types::Percentage;
use shopfront_core::validation::validate_price_cents;
use shopfront_db::Database;

use crate::error::ApiError;
use crate::state::CartStore;

/// Catalog data for a product being added.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub id: String,
    pub name: String,
    /// Tax-inclusive catalog price.
    pub price_cents: i64,
}

/// Cart response including lines and totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    /// Item count, not currency.
    pub total_quantity: i64,
    pub items_total_cents: i64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        CartView {
            lines: cart.lines().to_vec(),
            total_quantity: cart.total(),
            items_total_cents: cart.items_total().cents(),
        }
    }
}

/// Highest product discount in effect for `product_id` right now.
pub async fn active_discount(db: &Database, product_id: &str) -> Result<Option<Percentage>, ApiError> {
    let rows = db.discounts().list_active_for_product(product_id).await?;
    Ok(active_percentage_for(&rows, product_id, Utc::now()))
}

pub fn get_cart(cart: &CartStore) -> CartView {
    debug!("get_cart command");
    cart.with_cart(|c| CartView::from(c))
}

/// Adds a product, freezing its discounted price into the line.
///
/// A negative quantity decrements the existing line.
pub async fn add_to_cart(
    db: &Database,
    cart: &CartStore,
    product: ProductInput,
    quantity: i64,
) -> Result<CartView, ApiError> {
    debug!(product_id = %product.id, quantity, "add_to_cart command");

    validate_price_cents("price", product.price_cents)?;

    let discount = active_discount(db, &product.id).await?;
    let product = CartProduct {
        id: product.id,
        name: product.name,
        original_price_cents: product.price_cents,
        discount,
    };

    let updated = cart.add(&product, quantity)?;
    Ok(CartView::from(&updated))
}

pub fn update_cart_item(
    cart: &CartStore,
    product_id: &str,
    quantity: i64,
) -> Result<CartView, ApiError> {
    debug!(product_id = %product_id, quantity, "update_cart_item command");
    let updated = cart.set_quantity(product_id, quantity)?;
    Ok(CartView::from(&updated))
}

pub fn remove_from_cart(cart: &CartStore, product_id: &str) -> Result<CartView, ApiError> {
    debug!(product_id = %product_id, "remove_from_cart command");
    if !cart.remove(product_id)? {
        return Err(ApiError::cart(format!("Product {} not in cart", product_id)));
    }
    Ok(get_cart(cart))
}

pub fn clear_cart(cart: &CartStore) -> Result<CartView, ApiError> {
    debug!("clear_cart command");
    cart.clear()?;
    Ok(get_cart(cart))
}
