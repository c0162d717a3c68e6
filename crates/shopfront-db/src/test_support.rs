//! Fixtures shared by the repository tests.

use chrono::Utc;
use uuid::Uuid;

use crate::{Database, DbConfig};
use shopfront_core::cart::{Cart, CartProduct};
use shopfront_core::checkout::{build_order, CheckoutDraft};
use shopfront_core::pricing::PricingEngine;
use shopfront_core::{
    Address, Coupon, CouponType, CustomerDetails, Order, OrderItem, ShippingMethod, TaxRate,
};

pub(crate) fn standard_shipping() -> ShippingMethod {
    ShippingMethod {
        id: "ship-std".to_string(),
        code: "STD".to_string(),
        name: "Standard".to_string(),
        cost_cents: 1000,
        is_active: true,
    }
}

/// In-memory database with one shipping method and the `SPRING10` coupon.
pub(crate) async fn seeded_db() -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    db.shipping_methods().insert(&standard_shipping()).await.unwrap();
    db.coupons()
        .insert(&Coupon {
            id: "coupon-spring".to_string(),
            code: "SPRING10".to_string(),
            discount_type: CouponType::Percentage,
            value: 1000,
            valid_from: None,
            valid_to: None,
            max_uses_global: Some(100),
            max_uses_per_user: Some(1),
            is_active: true,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    db
}

/// Order for one 119.00 mug shipped standard, not yet persisted.
pub(crate) fn sample_order(submission_key: &str, user_id: Option<&str>) -> (Order, Vec<OrderItem>) {
    let mut draft = match user_id {
        Some(id) => CheckoutDraft::for_user(id, None),
        None => CheckoutDraft::guest(),
    };
    draft.set_customer(CustomerDetails {
        name: "Ana".to_string(),
        surname: "Pérez".to_string(),
        email: "ana@example.com".to_string(),
        phone: None,
    });
    draft.set_address(Address {
        street: "Calle Mayor 1".to_string(),
        city: "Madrid".to_string(),
        postal_code: "28013".to_string(),
        country: "ES".to_string(),
        region: None,
    });
    draft.select_shipping("ship-std");

    let mut cart = Cart::new();
    cart.add(
        &CartProduct {
            id: "prod-mug".to_string(),
            name: "Mug".to_string(),
            original_price_cents: 11900,
            discount: None,
        },
        1,
    )
    .unwrap();

    let shipping = standard_shipping();
    let quote = PricingEngine::new(TaxRate::from_bps(1900)).quote(
        cart.items_total(),
        shipping.cost(),
        None,
    );

    build_order(
        submission_key,
        &draft.freeze(),
        &shipping,
        None,
        cart.lines(),
        &quote,
        Utc::now(),
    )
}

/// Commits a sample order and returns it.
pub(crate) async fn place_order(db: &Database, user_id: Option<&str>) -> (Order, Vec<OrderItem>) {
    let (order, items) = sample_order(&Uuid::new_v4().to_string(), user_id);
    let mut uow = db.begin_checkout().await.unwrap();
    uow.insert_order(&order).await.unwrap();
    uow.insert_items(&items).await.unwrap();
    uow.commit().await.unwrap();
    (order, items)
}
