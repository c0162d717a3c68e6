//! # Tax Config Repository
//!
//! The `tax_config` table holds at most one row (`id = 1`).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct TaxConfigRepository {
    pool: SqlitePool,
}

impl TaxConfigRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TaxConfigRepository { pool }
    }

    /// Returns the stored rate in basis points, or `None` when no row exists.
    ///
    /// The value is returned as stored; callers decide whether it is usable.
    pub async fn get_rate_bps(&self) -> DbResult<Option<i64>> {
        debug!("Loading tax rate");

        let rate: Option<i64> = sqlx::query_scalar("SELECT rate_bps FROM tax_config WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(rate)
    }

    /// Creates or replaces the rate.
    pub async fn set_rate_bps(&self, rate_bps: i64) -> DbResult<()> {
        info!(rate_bps, "Setting tax rate");

        sqlx::query(
            r#"
            INSERT INTO tax_config (id, rate_bps, updated_at)
            VALUES (1, ?1, ?2)
            ON CONFLICT (id) DO UPDATE SET
                rate_bps = excluded.rate_bps,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(rate_bps)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
