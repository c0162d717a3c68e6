//! # Order Repository
//!
//! Database operations for orders and their item snapshots.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. CREATE (CheckoutUnitOfWork, one transaction)                       │
//! │     └── insert_order() → Order { status: pending_payment, version: 1 } │
//! │     └── insert_items() → OrderItem × n   (immutable afterwards)        │
//! │                                                                         │
//! │  2. TRANSITION (apply_transition, one transaction)                     │
//! │     └── UPDATE … WHERE id = ? AND status = from AND version = v        │
//! │         0 rows? → StaleState (or NotFound)                             │
//! │     └── to = paid ∧ from ≠ paid? → INSERT invoice_outbox               │
//! │                                                                         │
//! │  3. READ                                                               │
//! │     └── get_by_id / get_items / list_by_state                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::invoice_outbox;
use shopfront_core::order::Transition;
use shopfront_core::{InvoiceOutboxEntry, Order, OrderItem, OrderStatus};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Item snapshots of an order, in the order they were written.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = ?1 ORDER BY rowid",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Orders in `status`, newest first.
    pub async fn list_by_state(&self, status: OrderStatus, limit: u32) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE status = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Persists a state machine step.
    ///
    /// `order` carries the new status and payment fields; `transition.from`
    /// and `order.version` are what the caller loaded. The write only
    /// succeeds if the row still has that status and version, and when
    /// the transition enters `paid` an invoice outbox row is written in
    /// the same transaction.
    ///
    /// On success `order.version` and `order.updated_at` are refreshed and
    /// the queued outbox entry, if any, is returned.
    ///
    /// ## Errors
    /// - `NotFound` when the order does not exist
    /// - `StaleState` when it changed since it was loaded
    /// - `ConstraintViolation` when the row would pair cash with a proof
    pub async fn apply_transition(
        &self,
        order: &mut Order,
        transition: Transition,
    ) -> DbResult<Option<InvoiceOutboxEntry>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?2,
                payment_method = ?3,
                proof_url = ?4,
                version = version + 1,
                updated_at = ?5
            WHERE id = ?1 AND status = ?6 AND version = ?7
            "#,
        )
        .bind(&order.id)
        .bind(order.status)
        .bind(order.payment_method)
        .bind(&order.proof_url)
        .bind(now)
        .bind(transition.from)
        .bind(order.version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = ?1")
                .bind(&order.id)
                .fetch_optional(&mut *tx)
                .await?;
            return Err(match exists {
                Some(_) => DbError::stale("Order", &order.id),
                None => DbError::not_found("Order", &order.id),
            });
        }

        let queued = if transition.dispatches_invoice() {
            Some(invoice_outbox::enqueue(&mut *tx, &order.id, order.proof_url.as_deref()).await?)
        } else {
            None
        };

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        order.version += 1;
        order.updated_at = now;

        info!(
            order_id = %order.id,
            from = %transition.from,
            to = %transition.to,
            invoice_queued = queued.is_some(),
            "Order transition persisted"
        );

        Ok(queued)
    }
}

pub(crate) async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    debug!(id = %order.id, total_cents = order.total_cents, "Inserting order");

    let c = &order.customer;
    let a = &order.address;
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, submission_key, user_id,
            name, surname, email, phone,
            street, city, postal_code, country, region,
            shipping_method_id, shipping_cost_cents, coupon_id,
            items_total_cents, subtotal_cents, tax_cents, discount_cents, total_cents,
            status, payment_method, proof_url, version,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3,
            ?4, ?5, ?6, ?7,
            ?8, ?9, ?10, ?11, ?12,
            ?13, ?14, ?15,
            ?16, ?17, ?18, ?19, ?20,
            ?21, ?22, ?23, ?24,
            ?25, ?26
        )
        "#,
    )
    .bind(&order.id)
    .bind(&order.submission_key)
    .bind(&order.user_id)
    .bind(&c.name)
    .bind(&c.surname)
    .bind(&c.email)
    .bind(&c.phone)
    .bind(&a.street)
    .bind(&a.city)
    .bind(&a.postal_code)
    .bind(&a.country)
    .bind(&a.region)
    .bind(&order.shipping_method_id)
    .bind(order.shipping_cost_cents)
    .bind(&order.coupon_id)
    .bind(order.items_total_cents)
    .bind(order.subtotal_cents)
    .bind(order.tax_cents)
    .bind(order.discount_cents)
    .bind(order.total_cents)
    .bind(order.status)
    .bind(order.payment_method)
    .bind(&order.proof_url)
    .bind(order.version)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Snapshot pattern: names and prices are copied, never joined from a
/// catalog.
pub(crate) async fn insert_items(conn: &mut SqliteConnection, items: &[OrderItem]) -> DbResult<()> {
    for item in items {
        debug!(order_id = %item.order_id, product_id = %item.product_id, "Inserting order item");

        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, product_id, name,
                unit_price_cents, original_price_cents, quantity, line_total_cents,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&item.id)
        .bind(&item.order_id)
        .bind(&item.product_id)
        .bind(&item.name)
        .bind(item.unit_price_cents)
        .bind(item.original_price_cents)
        .bind(item.quantity)
        .bind(item.line_total_cents)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::test_support::{place_order, seeded_db};
    use crate::DbError;
    use shopfront_core::{OrderStatus, PaymentMethod};

    #[tokio::test]
    async fn test_get_order_and_items() {
        let db = seeded_db().await;
        let (order, items) = place_order(&db, None).await;

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::PendingPayment);
        assert_eq!(stored.total_cents, order.total_cents);
        assert_eq!(stored.customer, order.customer);
        assert_eq!(stored.version, 1);

        let stored_items = db.orders().get_items(&order.id).await.unwrap();
        assert_eq!(stored_items.len(), items.len());
        assert_eq!(stored_items[0].name, items[0].name);

        assert!(db.orders().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_items_are_immutable() {
        let db = seeded_db().await;
        let (order, _) = place_order(&db, None).await;

        let err = sqlx::query("UPDATE order_items SET unit_price_cents = 1 WHERE order_id = ?1")
            .bind(&order.id)
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_transition_to_paid_queues_one_invoice() {
        let db = seeded_db().await;
        let (mut order, _) = place_order(&db, None).await;
        let repo = db.orders();

        let t = order.attach_proof("https://cdn.example/p.png");
        assert!(repo.apply_transition(&mut order, t).await.unwrap().is_none());

        let t = order.set_status(OrderStatus::Paid);
        let queued = repo.apply_transition(&mut order, t).await.unwrap().unwrap();
        assert_eq!(queued.order_id, order.id);
        assert_eq!(queued.attachment.as_deref(), Some("https://cdn.example/p.png"));

        let t = order.set_status(OrderStatus::Paid);
        assert!(repo.apply_transition(&mut order, t).await.unwrap().is_none());

        let t = order.set_status(OrderStatus::Shipped);
        assert!(repo.apply_transition(&mut order, t).await.unwrap().is_none());

        let outbox = db.invoice_outbox().list_for_order(&order.id).await.unwrap();
        assert_eq!(outbox.len(), 1);

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Shipped);
        assert_eq!(stored.version, 5);
        assert_eq!(stored.version, order.version);
    }

    #[tokio::test]
    async fn test_stale_transition_rejected() {
        let db = seeded_db().await;
        let (order, _) = place_order(&db, None).await;
        let repo = db.orders();

        let mut first = order.clone();
        let mut second = order.clone();

        let t = first.set_status(OrderStatus::Paid);
        repo.apply_transition(&mut first, t).await.unwrap();

        let t = second.set_status(OrderStatus::Cancelled);
        let err = repo.apply_transition(&mut second, t).await.unwrap_err();
        assert!(matches!(err, DbError::StaleState { .. }));

        let stored = repo.get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
        assert_eq!(db.invoice_outbox().count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cash_with_proof_rejected_by_schema() {
        let db = seeded_db().await;
        let (mut order, _) = place_order(&db, None).await;

        let t = order.attach_proof("x");
        order.payment_method = PaymentMethod::Cash;
        let err = db.orders().apply_transition(&mut order, t).await.unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_list_by_state() {
        let db = seeded_db().await;
        let (mut paid, _) = place_order(&db, None).await;
        place_order(&db, None).await;

        let t = paid.set_status(OrderStatus::Paid);
        db.orders().apply_transition(&mut paid, t).await.unwrap();

        let pending = db
            .orders()
            .list_by_state(OrderStatus::PendingPayment, 10)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);

        let paid_orders = db.orders().list_by_state(OrderStatus::Paid, 10).await.unwrap();
        assert_eq!(paid_orders[0].id, paid.id);
    }
}
