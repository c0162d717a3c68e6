//! # Checkout Session
//!
//! One checkout, from the first form edit to the committed order.
//!
//! ## Commit Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CheckoutSession::commit()                            │
//! │                                                                         │
//! │  1. sync()                  freeze the draft into a CheckoutRequest    │
//! │  2. validate(cart)          ValidationError ──► nothing written        │
//! │  3. current_rate()          before the transaction opens               │
//! │                                                                         │
//! │  ┌─ BEGIN ─────────────────────────────────────────────────────────┐   │
//! │  │ 4. shipping method active?        ShippingMethodUnavailable     │   │
//! │  │ 5. coupon redeemable now?         UnknownCoupon/CouponRejected  │   │
//! │  │ 6. reprice lines at now           drift ──► warn!, new price    │   │
//! │  │ 7. quote                                                        │   │
//! │  │ 8. upsert profile (signed-in buyers only)                       │   │
//! │  │ 9. insert order (pending_payment) + item snapshots              │   │
//! │  └─ COMMIT ─────────────────────────────────────────────────────────┘   │
//! │     any failure inside ──► ROLLBACK, cart untouched                    │
//! │                                                                         │
//! │  10. clear the cart                                                    │
//! │  11. CheckoutReceipt { order_id, quote, price_drifts }                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Double Submission
//! Every session carries a `submission_key` stored in `orders.submission_key`
//! (UNIQUE). Committing the same key twice creates one order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shopfront_core::cart::CartLine;
use shopfront_core::checkout::{build_order, reprice, CheckoutDraft, CheckoutRequest, PriceDrift};
use shopfront_core::pricing::{PricingEngine, Quote};
use shopfront_core::{
    Address, CoreError, Coupon, CustomerDetails, CustomerProfile, Money, PaymentMethod,
    ShippingMethod, ValidationError,
};
use shopfront_db::Database;

use crate::error::ApiError;
use crate::state::{CartStore, TaxConfigState};

/// Result of a successful commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order_id: String,
    pub quote: Quote,
    /// Lines whose price changed since they were added to the cart.
    pub price_drifts: Vec<PriceDrift>,
}

pub struct CheckoutSession {
    db: Arc<Database>,
    cart: Arc<CartStore>,
    tax: Arc<TaxConfigState>,
    draft: CheckoutDraft,
    submission_key: String,
    committed_order: Option<String>,
}

impl CheckoutSession {
    /// Starts a checkout. Signed-in buyers get their stored profile
    /// prefilled; guests start empty.
    pub async fn start(
        db: Arc<Database>,
        cart: Arc<CartStore>,
        tax: Arc<TaxConfigState>,
        user_id: Option<String>,
    ) -> Result<Self, ApiError> {
        let draft = match user_id {
            Some(user_id) => {
                let profile = db.customers().get(&user_id).await?;
                debug!(user_id = %user_id, prefilled = profile.is_some(), "Checkout started");
                CheckoutDraft::for_user(user_id, profile.as_ref())
            }
            None => {
                debug!("Guest checkout started");
                CheckoutDraft::guest()
            }
        };

        Ok(CheckoutSession {
            db,
            cart,
            tax,
            draft,
            submission_key: Uuid::new_v4().to_string(),
            committed_order: None,
        })
    }

    /// Reuses the key of an earlier attempt, so retrying a commit whose
    /// outcome is unknown cannot create a second order.
    pub fn with_submission_key(mut self, submission_key: impl Into<String>) -> Self {
        self.submission_key = submission_key.into();
        self
    }

    pub fn submission_key(&self) -> &str {
        &self.submission_key
    }

    pub fn draft(&self) -> &CheckoutDraft {
        &self.draft
    }

    // =========================================================================
    // Form Writes
    // =========================================================================

    pub fn set_customer(&mut self, customer: CustomerDetails) {
        self.draft.set_customer(customer);
    }

    pub fn set_address(&mut self, address: Address) {
        self.draft.set_address(address);
    }

    pub fn select_shipping(&mut self, shipping_method_id: impl Into<String>) {
        self.draft.select_shipping(shipping_method_id);
    }

    pub fn apply_coupon_code(&mut self, code: &str) {
        self.draft.apply_coupon_code(code);
    }

    pub fn clear_coupon(&mut self) {
        self.draft.clear_coupon();
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) {
        self.draft.select_payment_method(method);
    }

    /// Flushes every edit made so far into an immutable request.
    pub fn sync(&self) -> CheckoutRequest {
        let request = self.draft.freeze();
        debug!(version = request.version, "Checkout draft synced");
        request
    }

    // =========================================================================
    // Preview
    // =========================================================================

    /// Prices the current cart and selections without writing anything.
    ///
    /// Uses the prices stored in the cart. No shipping selected means no
    /// shipping cost.
    pub async fn preview(&self) -> Result<Quote, ApiError> {
        let request = self.sync();
        let cart = self.cart.snapshot();
        let rate = self.tax.current_rate().await;
        let now = Utc::now();

        let shipping = match &request.shipping_method_id {
            Some(id) => {
                let method = self.db.shipping_methods().get_by_id(id).await?;
                active_shipping(id, method)?.cost()
            }
            None => Money::zero(),
        };

        let coupon = match &request.coupon_code {
            Some(code) => {
                let coupon = self.db.coupons().get_by_code(code).await?;
                let coupon = coupon.ok_or_else(|| CoreError::UnknownCoupon(code.clone()))?;
                let (global, user) = self
                    .db
                    .coupons()
                    .usage(&coupon.id, request.user_id.as_deref())
                    .await?;
                check_redeemable(code, &coupon, global, user, now)?;
                Some(coupon)
            }
            None => None,
        };

        let rule = coupon.as_ref().map(Coupon::rule);
        Ok(PricingEngine::new(rate).quote(cart.items_total(), shipping, rule.as_ref()))
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Places the order.
    ///
    /// ## Errors
    /// - `VALIDATION_ERROR` for an empty cart or missing fields; nothing is
    ///   written
    /// - `BUSINESS_LOGIC` for an unavailable shipping method, an unknown or
    ///   exhausted coupon, or a repeated submission
    /// - `DATABASE_ERROR` when the transaction fails; nothing is written
    pub async fn commit(&mut self) -> Result<CheckoutReceipt, ApiError> {
        if let Some(order_id) = &self.committed_order {
            warn!(order_id = %order_id, "Checkout already committed");
            return Err(ApiError::duplicate_submission());
        }

        let request = self.sync();
        let cart = self.cart.snapshot();
        request.validate(&cart)?;

        let shipping_id = request
            .shipping_method_id
            .clone()
            .ok_or_else(|| ValidationError::Required {
                field: "shipping_method".to_string(),
            })?;

        // The in-memory pool has a single connection; read the rate before
        // the transaction holds it.
        let rate = self.tax.current_rate().await;
        let now = Utc::now();

        let mut uow = self.db.begin_checkout().await?;

        let shipping = active_shipping(&shipping_id, uow.shipping_method(&shipping_id).await?)?;

        let coupon = match &request.coupon_code {
            Some(code) => {
                let coupon = uow
                    .coupon_by_code(code)
                    .await?
                    .ok_or_else(|| CoreError::UnknownCoupon(code.clone()))?;
                let (global, user) = uow
                    .coupon_usage(&coupon.id, request.user_id.as_deref())
                    .await?;
                check_redeemable(code, &coupon, global, user, now)?;
                Some(coupon)
            }
            None => None,
        };

        let product_ids: Vec<String> = cart
            .lines()
            .iter()
            .map(|line| line.product_id.clone())
            .collect();
        let discounts = uow.discounts_for(&product_ids).await?;
        let (lines, drifts) = reprice(cart.lines(), &discounts, now);
        for drift in &drifts {
            warn!(
                product_id = %drift.product_id,
                cart_price = drift.cart_price_cents,
                commit_price = drift.commit_price_cents,
                "Price changed since the product was added to the cart"
            );
        }

        let items_total: Money = lines.iter().map(CartLine::line_total).sum();
        let rule = coupon.as_ref().map(Coupon::rule);
        let quote = PricingEngine::new(rate).quote(items_total, shipping.cost(), rule.as_ref());

        if let Some(user_id) = &request.user_id {
            uow.upsert_profile(&CustomerProfile {
                user_id: user_id.clone(),
                customer: request.customer.clone(),
                address: request.address.clone(),
                updated_at: now,
            })
            .await?;
        }

        let (order, items) = build_order(
            &self.submission_key,
            &request,
            &shipping,
            coupon.as_ref(),
            &lines,
            &quote,
            now,
        );
        uow.insert_order(&order).await?;
        uow.insert_items(&items).await?;
        uow.commit().await?;

        info!(
            order_id = %order.id,
            total = %quote.total,
            items = items.len(),
            coupon = ?request.coupon_code,
            "Order placed"
        );
        self.committed_order = Some(order.id.clone());

        if let Err(e) = self.cart.clear() {
            warn!(order_id = %order.id, error = %e, "Order placed but the cart could not be cleared");
        }

        Ok(CheckoutReceipt {
            order_id: order.id,
            quote,
            price_drifts: drifts,
        })
    }
}

fn active_shipping(id: &str, method: Option<ShippingMethod>) -> Result<ShippingMethod, CoreError> {
    method
        .filter(|m| m.is_active)
        .ok_or_else(|| CoreError::ShippingMethodUnavailable(id.to_string()))
}

/// Coupon window and usage check at `now`, the same instant used for repricing.
fn check_redeemable(
    code: &str,
    coupon: &Coupon,
    global: i64,
    user: i64,
    now: DateTime<Utc>,
) -> Result<(), CoreError> {
    coupon
        .is_redeemable(now, global, user)
        .map_err(|reason| CoreError::CouponRejected {
            code: code.to_string(),
            reason,
        })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{ana, fixture, madrid, mug};
    use chrono::Duration;
    use shopfront_core::{CouponRejection, CouponType, OrderStatus, ProductDiscount};

    #[tokio::test]
    async fn test_commit_prices_coupon_over_items_and_shipping() {
        let fx = fixture().await;
        fx.cart.add(&mug(), 1).unwrap();

        let mut session = fx.filled_session(None).await;
        session.apply_coupon_code("spring10");

        let preview = session.preview().await.unwrap();
        let receipt = session.commit().await.unwrap();

        assert_eq!(receipt.quote.subtotal.cents(), 10000);
        assert_eq!(receipt.quote.tax.cents(), 1900);
        assert_eq!(receipt.quote.discount.cents(), 1290);
        assert_eq!(receipt.quote.total.cents(), 11610);
        assert_eq!(preview.total, receipt.quote.total);
        assert!(receipt.price_drifts.is_empty());

        let order = fx.db.orders().get_by_id(&receipt.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert_eq!(order.total_cents, 11610);
        assert_eq!(order.coupon_id.as_deref(), Some("coupon-spring"));

        let items = fx.db.orders().get_items(&order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price_cents, 11900);

        assert_eq!(fx.cart.total(), 0);
    }

    #[tokio::test]
    async fn test_validation_failure_writes_nothing() {
        let fx = fixture().await;
        fx.cart.add(&mug(), 1).unwrap();

        let mut session = fx.session(None).await;
        session.set_customer(ana());
        session.select_shipping("ship-std");

        let err = session.commit().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("street"));

        assert!(fx.db.orders().list_by_state(OrderStatus::PendingPayment, 10).await.unwrap().is_empty());
        assert_eq!(fx.cart.total(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let fx = fixture().await;
        let mut session = fx.filled_session(None).await;

        let err = session.commit().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_second_commit_is_duplicate() {
        let fx = fixture().await;
        fx.cart.add(&mug(), 1).unwrap();

        let mut session = fx.filled_session(None).await;
        session.commit().await.unwrap();

        fx.cart.add(&mug(), 1).unwrap();
        let err = session.commit().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert_eq!(err.message, ApiError::duplicate_submission().message);
    }

    #[tokio::test]
    async fn test_retry_with_same_key_creates_one_order() {
        let fx = fixture().await;
        fx.cart.add(&mug(), 1).unwrap();

        let mut first = fx.filled_session(None).await;
        let key = first.submission_key().to_string();
        first.commit().await.unwrap();

        fx.cart.add(&mug(), 1).unwrap();
        let mut retry = fx.filled_session(None).await.with_submission_key(key);
        let err = retry.commit().await.unwrap_err();
        assert_eq!(err.message, ApiError::duplicate_submission().message);

        let pending = fx.db.orders().list_by_state(OrderStatus::PendingPayment, 10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(fx.cart.total(), 1);
    }

    #[tokio::test]
    async fn test_per_user_coupon_limit() {
        let fx = fixture().await;

        fx.cart.add(&mug(), 1).unwrap();
        let mut first = fx.filled_session(Some("user-1")).await;
        first.apply_coupon_code("SPRING10");
        first.commit().await.unwrap();

        fx.cart.add(&mug(), 1).unwrap();
        let mut second = fx.filled_session(Some("user-1")).await;
        second.apply_coupon_code("SPRING10");
        let err = second.commit().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert!(err.message.contains("SPRING10"));

        // A different buyer can still use it.
        let mut other = fx.filled_session(Some("user-2")).await;
        other.apply_coupon_code("SPRING10");
        assert!(other.commit().await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_coupon_rejected() {
        let fx = fixture().await;
        fx.cart.add(&mug(), 1).unwrap();

        let mut session = fx.filled_session(None).await;
        session.apply_coupon_code("NOPE");
        assert!(session.preview().await.is_err());

        let err = session.commit().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert_eq!(fx.cart.total(), 1);
    }

    #[tokio::test]
    async fn test_inactive_shipping_rejected() {
        let fx = fixture().await;
        fx.cart.add(&mug(), 1).unwrap();
        fx.db.shipping_methods().set_active("ship-std", false).await.unwrap();

        let mut session = fx.filled_session(None).await;
        let err = session.commit().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert_eq!(fx.cart.total(), 1);
    }

    #[tokio::test]
    async fn test_discount_started_after_add_reprices() {
        let fx = fixture().await;
        fx.cart.add(&mug(), 1).unwrap();

        let now = Utc::now();
        fx.db
            .discounts()
            .insert(&ProductDiscount {
                id: "d-flash".into(),
                product_id: "prod-mug".into(),
                percentage_bps: 1000,
                is_active: true,
                window_start: Some(now - Duration::minutes(1)),
                window_end: Some(now + Duration::hours(1)),
                created_at: now,
            })
            .await
            .unwrap();

        let mut session = fx.filled_session(None).await;
        let receipt = session.commit().await.unwrap();

        assert_eq!(receipt.price_drifts.len(), 1);
        assert_eq!(receipt.price_drifts[0].cart_price_cents, 11900);
        assert_eq!(receipt.price_drifts[0].commit_price_cents, 10710);
        assert_eq!(receipt.quote.items_total.cents(), 10710);
        assert_eq!(receipt.quote.total.cents(), 11710);
    }

    #[tokio::test]
    async fn test_profile_saved_and_prefilled() {
        let fx = fixture().await;
        fx.cart.add(&mug(), 1).unwrap();

        let mut session = fx.filled_session(Some("user-1")).await;
        session.commit().await.unwrap();

        let profile = fx.db.customers().get("user-1").await.unwrap().unwrap();
        assert_eq!(profile.address, madrid());

        let next = fx.session(Some("user-1")).await;
        assert_eq!(next.draft().customer(), &ana());
        assert_eq!(next.draft().address(), &madrid());

        let guest = fx.session(None).await;
        assert_eq!(guest.draft().customer(), &CustomerDetails::default());
    }

    #[tokio::test]
    async fn test_failed_order_insert_rolls_back_profile() {
        let fx = fixture().await;
        fx.cart.add(&mug(), 1).unwrap();

        let mut first = fx.filled_session(None).await;
        let key = first.submission_key().to_string();
        first.commit().await.unwrap();

        fx.cart.add(&mug(), 1).unwrap();
        let mut reused = fx
            .filled_session(Some("user-9"))
            .await
            .with_submission_key(key);
        let err = reused.commit().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        assert!(fx.db.customers().get("user-9").await.unwrap().is_none());
        assert_eq!(fx.cart.total(), 1);
    }

    #[test]
    fn test_coupon_window_checked_at_given_instant() {
        let ends = Utc::now();
        let coupon = Coupon {
            id: "coupon-flash".to_string(),
            code: "FLASH".to_string(),
            discount_type: CouponType::Percentage,
            value: 500,
            valid_from: None,
            valid_to: Some(ends),
            max_uses_global: None,
            max_uses_per_user: None,
            is_active: true,
            created_at: ends - Duration::days(1),
        };

        assert!(check_redeemable("FLASH", &coupon, 0, 0, ends).is_ok());
        assert!(matches!(
            check_redeemable("FLASH", &coupon, 0, 0, ends + Duration::seconds(1)),
            Err(CoreError::CouponRejected {
                reason: CouponRejection::Expired,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_sync_sees_every_edit() {
        let fx = fixture().await;
        let mut session = fx.session(None).await;

        session.select_shipping("ship-std");
        session.apply_coupon_code(" spring10 ");
        let request = session.sync();

        assert_eq!(request.version, 2);
        assert_eq!(request.coupon_code.as_deref(), Some("SPRING10"));
        assert_eq!(request.shipping_method_id.as_deref(), Some("ship-std"));
    }
}
