//! # Shipping Method Repository

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use shopfront_core::ShippingMethod;

#[derive(Debug, Clone)]
pub struct ShippingMethodRepository {
    pool: SqlitePool,
}

impl ShippingMethodRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShippingMethodRepository { pool }
    }

    pub async fn insert(&self, method: &ShippingMethod) -> DbResult<()> {
        debug!(id = %method.id, code = %method.code, "Inserting shipping method");

        sqlx::query(
            r#"
            INSERT INTO shipping_methods (id, code, name, cost_cents, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&method.id)
        .bind(&method.code)
        .bind(&method.name)
        .bind(method.cost_cents)
        .bind(method.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ShippingMethod>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    pub async fn list_active(&self) -> DbResult<Vec<ShippingMethod>> {
        let methods = sqlx::query_as::<_, ShippingMethod>(
            "SELECT * FROM shipping_methods WHERE is_active = 1 ORDER BY cost_cents, name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(methods)
    }

    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE shipping_methods SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ShippingMethod", id));
        }
        Ok(())
    }
}

pub(crate) async fn fetch_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<ShippingMethod>> {
    let method = sqlx::query_as::<_, ShippingMethod>("SELECT * FROM shipping_methods WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn method(id: &str, cost: i64) -> ShippingMethod {
        ShippingMethod {
            id: id.to_string(),
            code: id.to_uppercase(),
            name: format!("Method {id}"),
            cost_cents: cost,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_insert_get_and_deactivate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.shipping_methods();

        repo.insert(&method("express", 1500)).await.unwrap();
        repo.insert(&method("standard", 500)).await.unwrap();

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].id, "standard");

        repo.set_active("express", false).await.unwrap();
        assert_eq!(repo.list_active().await.unwrap().len(), 1);

        let express = repo.get_by_id("express").await.unwrap().unwrap();
        assert!(!express.is_active);
        assert_eq!(express.cost_cents, 1500);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
        assert!(matches!(
            repo.set_active("missing", true).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
