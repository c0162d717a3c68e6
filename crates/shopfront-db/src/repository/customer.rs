//! # Customer Profile Repository
//!
//! Profiles exist only for authenticated buyers; guests never get a row.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use shopfront_core::CustomerProfile;

#[derive(Debug, Clone)]
pub struct CustomerProfileRepository {
    pool: SqlitePool,
}

impl CustomerProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerProfileRepository { pool }
    }

    pub async fn get(&self, user_id: &str) -> DbResult<Option<CustomerProfile>> {
        let profile =
            sqlx::query_as::<_, CustomerProfile>("SELECT * FROM customer_profiles WHERE user_id = ?1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(profile)
    }

    pub async fn upsert(&self, profile: &CustomerProfile) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        upsert(&mut conn, profile).await
    }
}

/// Inserts the profile or overwrites every field of the existing one.
pub(crate) async fn upsert(conn: &mut SqliteConnection, profile: &CustomerProfile) -> DbResult<()> {
    debug!(user_id = %profile.user_id, "Upserting customer profile");

    let c = &profile.customer;
    let a = &profile.address;
    sqlx::query(
        r#"
        INSERT INTO customer_profiles (
            user_id, name, surname, email, phone,
            street, city, postal_code, country, region, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT (user_id) DO UPDATE SET
            name = excluded.name,
            surname = excluded.surname,
            email = excluded.email,
            phone = excluded.phone,
            street = excluded.street,
            city = excluded.city,
            postal_code = excluded.postal_code,
            country = excluded.country,
            region = excluded.region,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&profile.user_id)
    .bind(&c.name)
    .bind(&c.surname)
    .bind(&c.email)
    .bind(&c.phone)
    .bind(&a.street)
    .bind(&a.city)
    .bind(&a.postal_code)
    .bind(&a.country)
    .bind(&a.region)
    .bind(profile.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Utc;
    use shopfront_core::{Address, CustomerDetails};

    fn profile(city: &str) -> CustomerProfile {
        CustomerProfile {
            user_id: "user-1".to_string(),
            customer: CustomerDetails {
                name: "Ana".to_string(),
                surname: "Pérez".to_string(),
                email: "ana@example.com".to_string(),
                phone: None,
            },
            address: Address {
                street: "Calle Mayor 1".to_string(),
                city: city.to_string(),
                postal_code: "28013".to_string(),
                country: "ES".to_string(),
                region: Some("Madrid".to_string()),
            },
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        assert!(repo.get("user-1").await.unwrap().is_none());

        repo.upsert(&profile("Madrid")).await.unwrap();
        repo.upsert(&profile("Sevilla")).await.unwrap();

        let stored = repo.get("user-1").await.unwrap().unwrap();
        assert_eq!(stored.address.city, "Sevilla");
        assert_eq!(stored.address.region.as_deref(), Some("Madrid"));
        assert_eq!(stored.customer.email, "ana@example.com");
    }
}
