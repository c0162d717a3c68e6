//! # Coupon Repository
//!
//! Coupons are read-only for the order flow. Usage is never stored on the
//! coupon row; it is counted from the orders that reference it, so the
//! count is always consistent with the orders actually placed.
//!
//! ```text
//! global uses   = COUNT(orders WHERE coupon_id = c AND status ≠ cancelled)
//! per-user uses = same, AND user_id = u
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use shopfront_core::Coupon;

#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(id = %coupon.id, code = %coupon.code, "Inserting coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, discount_type, value,
                valid_from, valid_to, max_uses_global, max_uses_per_user,
                is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(coupon.discount_type)
        .bind(coupon.value)
        .bind(coupon.valid_from)
        .bind(coupon.valid_to)
        .bind(coupon.max_uses_global)
        .bind(coupon.max_uses_per_user)
        .bind(coupon.is_active)
        .bind(coupon.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Looks a coupon up by code, ignoring case.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_code(&mut conn, code).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(coupon)
    }

    /// Returns `(global_uses, user_uses)`; `user_uses` is 0 for guests.
    pub async fn usage(&self, coupon_id: &str, user_id: Option<&str>) -> DbResult<(i64, i64)> {
        let mut conn = self.pool.acquire().await?;
        count_usage(&mut conn, coupon_id, user_id).await
    }

    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE coupons SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }
        Ok(())
    }
}

pub(crate) async fn fetch_by_code(
    conn: &mut SqliteConnection,
    code: &str,
) -> DbResult<Option<Coupon>> {
    // `code` is declared COLLATE NOCASE
    let coupon = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE code = ?1")
        .bind(code.trim())
        .fetch_optional(&mut *conn)
        .await?;

    Ok(coupon)
}

pub(crate) async fn count_usage(
    conn: &mut SqliteConnection,
    coupon_id: &str,
    user_id: Option<&str>,
) -> DbResult<(i64, i64)> {
    let (global, user): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COALESCE(SUM(CASE WHEN ?2 IS NOT NULL AND user_id = ?2 THEN 1 ELSE 0 END), 0)
        FROM orders
        WHERE coupon_id = ?1 AND status != 'cancelled'
        "#,
    )
    .bind(coupon_id)
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    debug!(coupon_id = %coupon_id, global, user, "Counted coupon usage");
    Ok((global, user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Utc;
    use shopfront_core::CouponType;

    fn test_coupon(id: &str, code: &str) -> Coupon {
        Coupon {
            id: id.to_string(),
            code: code.to_string(),
            discount_type: CouponType::Percentage,
            value: 1000,
            valid_from: None,
            valid_to: None,
            max_uses_global: Some(10),
            max_uses_per_user: Some(1),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.coupons();
        repo.insert(&test_coupon("c-1", "SPRING10")).await.unwrap();

        let found = repo.get_by_code("spring10").await.unwrap().unwrap();
        assert_eq!(found.id, "c-1");
        assert_eq!(found.discount_type, CouponType::Percentage);
        assert_eq!(found.max_uses_per_user, Some(1));

        assert!(repo.get_by_code("WINTER").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.coupons();
        repo.insert(&test_coupon("c-1", "SPRING10")).await.unwrap();

        let err = repo.insert(&test_coupon("c-2", "spring10")).await.unwrap_err();
        assert!(err.is_unique_violation_on("coupons.code"));
    }

    #[tokio::test]
    async fn test_usage_without_orders() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.coupons();
        repo.insert(&test_coupon("c-1", "SPRING10")).await.unwrap();

        assert_eq!(repo.usage("c-1", Some("user-1")).await.unwrap(), (0, 0));
        assert_eq!(repo.usage("c-1", None).await.unwrap(), (0, 0));
    }
}
