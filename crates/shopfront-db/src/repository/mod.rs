//! # Repository Module
//!
//! Database repository implementations for Shopfront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service (storefront app)                                              │
//! │       │                                                                 │
//! │       │  db.orders().get_by_id("…")                                    │
//! │       ▼                                                                 │
//! │  OrderRepository { pool }                                              │
//! │       │                                                                 │
//! │       │  acquire connection                                             │
//! │       ▼                                                                 │
//! │  order::fetch_by_id(&mut conn, id)  ◄── also called by                 │
//! │       │                                 CheckoutUnitOfWork with its     │
//! │       ▼                                 open transaction                │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Statements that must also run inside a transaction are free functions
//! over `&mut SqliteConnection`; the repository methods acquire a pooled
//! connection and delegate to them.
//!
//! ## Available Repositories
//!
//! - [`tax_config::TaxConfigRepository`] - Single-row tax rate
//! - [`shipping::ShippingMethodRepository`] - Shipping methods
//! - [`coupon::CouponRepository`] - Coupons and their usage counts
//! - [`discount::DiscountRepository`] - Per-product discounts
//! - [`customer::CustomerProfileRepository`] - Stored buyer profiles
//! - [`order::OrderRepository`] - Orders, items, state transitions
//! - [`invoice_outbox::InvoiceOutboxRepository`] - Invoice notification queue

pub mod coupon;
pub mod customer;
pub mod discount;
pub mod invoice_outbox;
pub mod order;
pub mod shipping;
pub mod tax_config;
