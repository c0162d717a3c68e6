//! Fixtures shared by the command tests.

use chrono::Utc;
use std::sync::Arc;
use tempfile::TempDir;

use shopfront_core::cart::CartProduct;
use shopfront_core::{Address, Coupon, CouponType, CustomerDetails, ShippingMethod, TaxRate};
use shopfront_db::{Database, DbConfig};

use crate::commands::CheckoutSession;
use crate::state::{CartStore, TaxConfigState};

pub(crate) struct Fixture {
    pub db: Arc<Database>,
    pub cart: Arc<CartStore>,
    pub tax: Arc<TaxConfigState>,
    pub dir: TempDir,
}

impl Fixture {
    pub async fn session(&self, user_id: Option<&str>) -> CheckoutSession {
        CheckoutSession::start(
            self.db.clone(),
            self.cart.clone(),
            self.tax.clone(),
            user_id.map(str::to_string),
        )
        .await
        .unwrap()
    }

    /// Session with every required field filled and standard shipping.
    pub async fn filled_session(&self, user_id: Option<&str>) -> CheckoutSession {
        let mut session = self.session(user_id).await;
        session.set_customer(ana());
        session.set_address(madrid());
        session.select_shipping("ship-std");
        session
    }
}

/// In-memory database with standard shipping (10.00) and the `SPRING10`
/// coupon (10%, once per user), plus an empty cart file.
pub(crate) async fn fixture() -> Fixture {
    let db = Arc::new(Database::new(DbConfig::in_memory()).await.unwrap());
    db.shipping_methods()
        .insert(&ShippingMethod {
            id: "ship-std".to_string(),
            code: "STD".to_string(),
            name: "Standard".to_string(),
            cost_cents: 1000,
            is_active: true,
        })
        .await
        .unwrap();
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

    let dir = tempfile::tempdir().unwrap();
    let cart = Arc::new(CartStore::open(dir.path().join("cart.json")));
    let tax = Arc::new(TaxConfigState::new(db.clone(), TaxRate::from_bps(1900)));

    Fixture { db, cart, tax, dir }
}

/// A 119.00 mug, tax included.
pub(crate) fn mug() -> CartProduct {
    CartProduct {
        id: "prod-mug".to_string(),
        name: "Mug".to_string(),
        original_price_cents: 11900,
        discount: None,
    }
}

pub(crate) fn ana() -> CustomerDetails {
    CustomerDetails {
        name: "Ana".to_string(),
        surname: "Pérez".to_string(),
        email: "ana@example.com".to_string(),
        phone: None,
    }
}

pub(crate) fn madrid() -> Address {
    Address {
        street: "Calle Mayor 1".to_string(),
        city: "Madrid".to_string(),
        postal_code: "28013".to_string(),
        country: "ES".to_string(),
        region: None,
    }
}
