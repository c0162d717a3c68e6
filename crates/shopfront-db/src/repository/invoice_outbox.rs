//! # Invoice Outbox Repository
//!
//! Queue of invoice notifications owed to the billing endpoint.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ADMIN TRANSITION (in_review → paid)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │  1. UPDATE orders SET status = 'paid' WHERE id = ? AND          │   │
//! │  │     status = 'in_review' AND version = ?                        │   │
//! │  │  2. INSERT INTO invoice_outbox (order_id, attachment)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← both or neither                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OutboxProcessor (shopfront-notify)                                    │
//! │    SELECT … WHERE sent_at IS NULL                                      │
//! │    POST /invoice ─► ok: mark_sent │ err: mark_failed (attempts += 1)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use shopfront_core::InvoiceOutboxEntry;

#[derive(Debug, Clone)]
pub struct InvoiceOutboxRepository {
    pool: SqlitePool,
}

impl InvoiceOutboxRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceOutboxRepository { pool }
    }

    /// Unsent entries that have failed fewer than `max_attempts` times,
    /// oldest first.
    pub async fn get_pending(
        &self,
        limit: u32,
        max_attempts: i64,
    ) -> DbResult<Vec<InvoiceOutboxEntry>> {
        let entries = sqlx::query_as::<_, InvoiceOutboxEntry>(
            r#"
            SELECT * FROM invoice_outbox
            WHERE sent_at IS NULL AND attempts < ?2
            ORDER BY created_at ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .bind(max_attempts)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn mark_sent(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE invoice_outbox SET
                sent_at = ?2,
                attempted_at = ?2,
                attempts = attempts + 1,
                last_error = NULL
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE invoice_outbox SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Unsent entries, including those past their attempt budget.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invoice_outbox WHERE sent_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// All entries ever queued for an order.
    pub async fn list_for_order(&self, order_id: &str) -> DbResult<Vec<InvoiceOutboxEntry>> {
        let entries = sqlx::query_as::<_, InvoiceOutboxEntry>(
            "SELECT * FROM invoice_outbox WHERE order_id = ?1 ORDER BY created_at",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

/// Queues an invoice for `order_id`. Called inside the transition
/// transaction.
pub(crate) async fn enqueue(
    conn: &mut SqliteConnection,
    order_id: &str,
    attachment: Option<&str>,
) -> DbResult<InvoiceOutboxEntry> {
    let entry = InvoiceOutboxEntry {
        id: Uuid::new_v4().to_string(),
        order_id: order_id.to_string(),
        attachment: attachment.map(str::to_string),
        attempts: 0,
        last_error: None,
        created_at: Utc::now(),
        attempted_at: None,
        sent_at: None,
    };

    debug!(order_id = %order_id, entry_id = %entry.id, "Queuing invoice");

    sqlx::query(
        r#"
        INSERT INTO invoice_outbox (
            id, order_id, attachment, attempts, last_error,
            created_at, attempted_at, sent_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.order_id)
    .bind(&entry.attachment)
    .bind(entry.attempts)
    .bind(&entry.last_error)
    .bind(entry.created_at)
    .bind(entry.attempted_at)
    .bind(entry.sent_at)
    .execute(&mut *conn)
    .await?;

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use crate::test_support::{place_order, seeded_db};
    use shopfront_core::OrderStatus;

    #[tokio::test]
    async fn test_pending_lifecycle() {
        let db = seeded_db().await;
        let (mut order, _) = place_order(&db, None).await;
        let t = order.set_status(OrderStatus::Paid);
        let entry = db.orders().apply_transition(&mut order, t).await.unwrap().unwrap();
        let outbox = db.invoice_outbox();

        assert_eq!(outbox.get_pending(10, 3).await.unwrap().len(), 1);

        outbox.mark_failed(&entry.id, "HTTP 503").await.unwrap();
        let pending = outbox.get_pending(10, 3).await.unwrap();
        assert_eq!(pending[0].attempts, 1);
        assert_eq!(pending[0].last_error.as_deref(), Some("HTTP 503"));
        assert!(pending[0].attempted_at.is_some());

        // exhausted entries stay pending but are no longer handed out
        assert!(outbox.get_pending(10, 1).await.unwrap().is_empty());
        assert_eq!(outbox.count_pending().await.unwrap(), 1);

        outbox.mark_sent(&entry.id).await.unwrap();
        assert!(outbox.get_pending(10, 3).await.unwrap().is_empty());
        assert_eq!(outbox.count_pending().await.unwrap(), 0);

        let all = outbox.list_for_order(&order.id).await.unwrap();
        assert_eq!(all[0].attempts, 2);
        assert!(all[0].sent_at.is_some());
        assert!(all[0].last_error.is_none());
    }
}
