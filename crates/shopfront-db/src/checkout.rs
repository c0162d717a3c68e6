//! # Checkout Unit of Work
//!
//! One SQLite transaction spanning every read and write of a checkout
//! commit. Coupon limits are counted and the order is inserted inside the
//! same transaction, so two commits can never both claim the last use.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  db.begin_checkout()                                                    │
//! │    ├── shipping_method(id)          ─┐                                  │
//! │    ├── coupon_by_code(code)          │ reads see a consistent snapshot  │
//! │    ├── coupon_usage(coupon, user)    │                                  │
//! │    ├── discounts_for(products)      ─┘                                  │
//! │    ├── upsert_profile(profile)      ─┐                                  │
//! │    ├── insert_order(order)           │ writes                           │
//! │    ├── insert_items(items)          ─┘                                  │
//! │    └── commit()    (drop without commit → rollback)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{coupon, customer, discount, order, shipping};
use shopfront_core::{Coupon, CustomerProfile, Order, OrderItem, ProductDiscount, ShippingMethod};

pub struct CheckoutUnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl CheckoutUnitOfWork {
    pub(crate) async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Checkout transaction opened");
        Ok(CheckoutUnitOfWork { tx })
    }

    pub async fn shipping_method(&mut self, id: &str) -> DbResult<Option<ShippingMethod>> {
        shipping::fetch_by_id(&mut *self.tx, id).await
    }

    pub async fn coupon_by_code(&mut self, code: &str) -> DbResult<Option<Coupon>> {
        coupon::fetch_by_code(&mut *self.tx, code).await
    }

    /// `(global_uses, user_uses)` as seen by this transaction.
    pub async fn coupon_usage(
        &mut self,
        coupon_id: &str,
        user_id: Option<&str>,
    ) -> DbResult<(i64, i64)> {
        coupon::count_usage(&mut *self.tx, coupon_id, user_id).await
    }

    pub async fn discounts_for(&mut self, product_ids: &[String]) -> DbResult<Vec<ProductDiscount>> {
        discount::fetch_active_for_products(&mut *self.tx, product_ids).await
    }

    pub async fn upsert_profile(&mut self, profile: &CustomerProfile) -> DbResult<()> {
        customer::upsert(&mut *self.tx, profile).await
    }

    /// Fails with a unique violation on `orders.submission_key` when the
    /// same submission was already committed.
    pub async fn insert_order(&mut self, order: &Order) -> DbResult<()> {
        order::insert_order(&mut *self.tx, order).await
    }

    pub async fn insert_items(&mut self, items: &[OrderItem]) -> DbResult<()> {
        order::insert_items(&mut *self.tx, items).await
    }

    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Checkout transaction committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{place_order, seeded_db, sample_order};
    use crate::DbError;

    #[tokio::test]
    async fn test_reads_inside_transaction() {
        let db = seeded_db().await;
        let mut uow = db.begin_checkout().await.unwrap();

        let method = uow.shipping_method("ship-std").await.unwrap().unwrap();
        assert_eq!(method.cost_cents, 1000);

        let coupon = uow.coupon_by_code("spring10").await.unwrap().unwrap();
        assert_eq!(uow.coupon_usage(&coupon.id, None).await.unwrap(), (0, 0));

        assert!(uow.discounts_for(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let db = seeded_db().await;
        let (order, items) = sample_order("key-rollback", None);

        {
            let mut uow = db.begin_checkout().await.unwrap();
            uow.insert_order(&order).await.unwrap();
            uow.insert_items(&items).await.unwrap();
        }

        assert!(db.orders().get_by_id(&order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_submission_key() {
        let db = seeded_db().await;
        let (first, _) = place_order(&db, None).await;

        let (mut again, _) = sample_order(&first.submission_key, None);
        again.id = "another-id".to_string();

        let mut uow = db.begin_checkout().await.unwrap();
        let err = uow.insert_order(&again).await.unwrap_err();
        assert!(err.is_unique_violation_on("orders.submission_key"));
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_coupon_usage_counts_committed_orders() {
        let db = seeded_db().await;
        let coupon = db.coupons().get_by_code("SPRING10").await.unwrap().unwrap();

        let (mut order, items) = sample_order("key-coupon", Some("user-1"));
        order.coupon_id = Some(coupon.id.clone());
        let mut uow = db.begin_checkout().await.unwrap();
        uow.insert_order(&order).await.unwrap();
        uow.insert_items(&items).await.unwrap();
        assert_eq!(uow.coupon_usage(&coupon.id, Some("user-1")).await.unwrap(), (1, 1));
        uow.commit().await.unwrap();

        assert_eq!(db.coupons().usage(&coupon.id, Some("user-1")).await.unwrap(), (1, 1));
        assert_eq!(db.coupons().usage(&coupon.id, Some("user-2")).await.unwrap(), (1, 0));
    }
}
