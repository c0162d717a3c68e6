//! # shopfront-notify: Invoice Dispatch for Shopfront
//!
//! Delivers the invoice notification owed once an order first reaches
//! `paid`.
//!
//! ## How an Invoice Gets Sent
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderRepository::apply_transition (shopfront-db)                       │
//! │    UPDATE orders … + INSERT invoice_outbox   (one transaction)          │
//! │                               │                                         │
//! │                               ▼                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                shopfront-notify (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │  OutboxProcessor ──► InvoiceDispatcher ──► InvoiceTransport     │   │
//! │  │  (poll + ack)        (deliver/dispatch)    (HTTP + backoff)     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                               │                                         │
//! │                               ▼                                         │
//! │  POST {endpoint}/invoice {"order_id": "...", "attachment": "..."}       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Endpoint and poll settings
//! - [`dispatcher`] - Fire-and-forget and reporting delivery
//! - [`error`] - Notify error types
//! - [`outbox`] - Outbox poll loop
//! - [`transport`] - `InvoiceTransport` trait and the HTTP implementation
//!
//! ## Usage
//! ```rust,ignore
//! use shopfront_notify::{HttpInvoiceTransport, InvoiceDispatcher, NotifyConfig, OutboxProcessor};
//!
//! let config = Arc::new(NotifyConfig::default());
//! let transport = Arc::new(HttpInvoiceTransport::new(&config)?);
//! let (processor, handle) =
//!     OutboxProcessor::new(db, config, InvoiceDispatcher::new(transport));
//! tokio::spawn(processor.run());
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod outbox;
pub mod transport;

pub use config::NotifyConfig;
pub use dispatcher::InvoiceDispatcher;
pub use error::{NotifyError, NotifyResult};
pub use outbox::{BatchReport, OutboxProcessor, OutboxProcessorHandle};
pub use transport::{HttpInvoiceTransport, InvoiceRequest, InvoiceTransport};
