//! # Product Discount Repository
//!
//! Stores per-product markdowns. Window filtering and "highest wins" live in
//! `shopfront_core::discount`; this repository only returns candidate rows
//! in insertion order so ties resolve to the oldest row.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use shopfront_core::ProductDiscount;

#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    pub async fn insert(&self, discount: &ProductDiscount) -> DbResult<()> {
        debug!(
            id = %discount.id,
            product_id = %discount.product_id,
            percentage_bps = discount.percentage_bps,
            "Inserting product discount"
        );

        sqlx::query(
            r#"
            INSERT INTO product_discounts (
                id, product_id, percentage_bps, is_active,
                window_start, window_end, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&discount.id)
        .bind(&discount.product_id)
        .bind(discount.percentage_bps)
        .bind(discount.is_active)
        .bind(discount.window_start)
        .bind(discount.window_end)
        .bind(discount.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Rows with the active flag set for one product, oldest first.
    ///
    /// Window membership is not checked here.
    pub async fn list_active_for_product(&self, product_id: &str) -> DbResult<Vec<ProductDiscount>> {
        let mut conn = self.pool.acquire().await?;
        fetch_active_for_products(&mut conn, &[product_id.to_string()]).await
    }

    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE product_discounts SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ProductDiscount", id));
        }
        Ok(())
    }
}

/// Active-flag rows for any of `product_ids`, in insertion order.
pub(crate) async fn fetch_active_for_products(
    conn: &mut SqliteConnection,
    product_ids: &[String],
) -> DbResult<Vec<ProductDiscount>> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM product_discounts WHERE is_active = 1 AND product_id IN (");
    let mut separated = builder.separated(", ");
    for id in product_ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(") ORDER BY rowid");

    let discounts = builder
        .build_query_as::<ProductDiscount>()
        .fetch_all(&mut *conn)
        .await?;

    Ok(discounts)
}
