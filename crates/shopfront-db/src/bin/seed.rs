//! # Demo Data Seeder
//!
//! Populates a database with the reference data a storefront needs before
//! it can take orders.
//!
//! ## Usage
//! ```bash
//! cargo run -p shopfront-db --bin seed
//!
//! # Specify database path
//! cargo run -p shopfront-db --bin seed -- --db ./data/shopfront.db
//! ```
//!
//! ## Seeded Rows
//! - Tax rate: 19% (1900 bps)
//! - Shipping methods: pickup, standard, express
//! - Coupons: `WELCOME10` (10%, once per user), `FLAT5` (5.00 off, 50 uses)
//! - Product discounts: a permanent 15% markdown and a week-long 25% sale

use chrono::{Duration, Utc};
use shopfront_core::{Coupon, CouponType, ProductDiscount, ShippingMethod, DEFAULT_TAX_RATE_BPS};
use shopfront_db::{Database, DbConfig};
use std::env;
use uuid::Uuid;

/// (code, name, cost in cents)
const SHIPPING_METHODS: &[(&str, &str, i64)] = &[
    ("PICKUP", "Store pickup", 0),
    ("STD", "Standard delivery", 495),
    ("EXP", "Express delivery", 1290),
];

/// (product id, percentage in bps, window length in days; 0 = open-ended)
const DISCOUNTS: &[(&str, i64, i64)] = &[
    ("prod-mug", 1500, 0),
    ("prod-tee", 2500, 7),
    ("prod-tee", 1000, 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./shopfront_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopfront Demo Data Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./shopfront_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Shopfront Demo Data Seeder");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.shipping_methods().list_active().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} shipping methods", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    db.tax_config().set_rate_bps(i64::from(DEFAULT_TAX_RATE_BPS)).await?;
    println!("✓ Tax rate set to {} bps", DEFAULT_TAX_RATE_BPS);

    for (code, name, cost_cents) in SHIPPING_METHODS {
        db.shipping_methods()
            .insert(&ShippingMethod {
                id: Uuid::new_v4().to_string(),
                code: code.to_string(),
                name: name.to_string(),
                cost_cents: *cost_cents,
                is_active: true,
            })
            .await?;
    }
    println!("✓ {} shipping methods", SHIPPING_METHODS.len());

    let now = Utc::now();
    let coupons = [
        seed_coupon("WELCOME10", CouponType::Percentage, 1000, None, Some(1)),
        seed_coupon("FLAT5", CouponType::Fixed, 500, Some(50), None),
    ];
    for coupon in &coupons {
        if let Err(e) = db.coupons().insert(coupon).await {
            eprintln!("Failed to insert coupon {}: {}", coupon.code, e);
        }
    }
    println!("✓ {} coupons", coupons.len());

    for (product_id, bps, days) in DISCOUNTS {
        let window_end = (*days > 0).then(|| now + Duration::days(*days));
        db.discounts()
            .insert(&ProductDiscount {
                id: Uuid::new_v4().to_string(),
                product_id: product_id.to_string(),
                percentage_bps: *bps,
                is_active: true,
                window_start: window_end.map(|_| now),
                window_end,
                created_at: now,
            })
            .await?;
    }
    println!("✓ {} product discounts", DISCOUNTS.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn seed_coupon(
    code: &str,
    discount_type: CouponType,
    value: i64,
    max_uses_global: Option<i64>,
    max_uses_per_user: Option<i64>,
) -> Coupon {
    Coupon {
        id: Uuid::new_v4().to_string(),
        code: code.to_string(),
        discount_type,
        value,
        valid_from: None,
        valid_to: None,
        max_uses_global,
        max_uses_per_user,
        is_active: true,
        created_at: Utc::now(),
    }
}
