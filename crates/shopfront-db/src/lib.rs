//! # shopfront-db: Database Layer for Shopfront
//!
//! SQLite persistence for orders, the reference data pricing reads
//! (tax rate, shipping methods, coupons, product discounts), customer
//! profiles, and the invoice outbox.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfront Data Flow                              │
//! │                                                                         │
//! │  CheckoutSession::commit / OrderService::pay_transfer                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   shopfront-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │   │   │
//! │  │   │               │    │ OrderRepo      │   │              │   │   │
//! │  │   │ SqlitePool    │◄───│ CouponRepo     │   │ 0001_initial │   │   │
//! │  │   │               │    │ OutboxRepo ... │   │              │   │   │
//! │  │   └───────┬───────┘    └────────────────┘   └──────────────┘   │   │
//! │  │           │                                                     │   │
//! │  │           └──► CheckoutUnitOfWork (checkout.rs)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and repository accessors
//! - [`checkout`] - Transaction wrapper for checkout commits
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per table
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopfront_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("shopfront.db")).await?;
//!
//! let methods = db.shipping_methods().list_active().await?;
//! let order = db.orders().get_by_id(&order_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::CheckoutUnitOfWork;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::coupon::CouponRepository;
pub use repository::customer::CustomerProfileRepository;
pub use repository::discount::DiscountRepository;
pub use repository::invoice_outbox::InvoiceOutboxRepository;
pub use repository::order::OrderRepository;
pub use repository::shipping::ShippingMethodRepository;
pub use repository::tax_config::TaxConfigRepository;
