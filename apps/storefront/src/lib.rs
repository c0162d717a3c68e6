//! # Storefront Library
//!
//! Orchestration layer of Shopfront: wires configuration, the database,
//! the durable cart, proof storage and the invoice notifier into the
//! commands the `storefront` binary exposes.
//!
//! ## Module Organization
//! ```text
//! storefront_lib/
//! ├── lib.rs          ◄─── You are here (AppContext, tracing, entry point)
//! ├── cli.rs          ◄─── clap command tree
//! ├── commands/       ◄─── cart, CheckoutSession, OrderService
//! ├── state/          ◄─── AppConfig, TaxConfigState, CartStore
//! ├── storage.rs      ◄─── ProofStorage for payment proofs
//! └── error.rs        ◄─── ApiError returned by every command
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()          RUST_LOG or the default filter             │
//! │  2. AppConfig::load()       defaults → storefront.toml → SHOPFRONT_*   │
//! │  3. AppContext::open()      SQLite + migrations, cart file, storage    │
//! │  4. dispatch the CLI command                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod state;
pub mod storage;

#[cfg(test)]
mod test_support;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopfront_db::{Database, DbConfig};
use shopfront_notify::{
    HttpInvoiceTransport, InvoiceDispatcher, OutboxProcessor, OutboxProcessorHandle,
};

use commands::{CheckoutSession, OrderService};
use error::ApiError;
use state::{AppConfig, CartStore, TaxConfigState};
use storage::{LocalProofStorage, ProofStorage};

/// Everything a command needs, opened once per process.
pub struct AppContext {
    pub config: AppConfig,
    pub db: Arc<Database>,
    pub cart: Arc<CartStore>,
    pub tax: Arc<TaxConfigState>,
    pub storage: Arc<dyn ProofStorage>,
}

impl AppContext {
    pub async fn open(config: AppConfig) -> Result<Self, ApiError> {
        if let Some(parent) = config.database.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ApiError::internal(format!("Failed to create data directory: {}", e))
                })?;
            }
        }

        info!(path = ?config.database.path, "Opening database");
        let db = Arc::new(Database::new(DbConfig::new(&config.database.path)).await?);

        let cart = Arc::new(CartStore::open(&config.cart.path));
        let tax = Arc::new(TaxConfigState::new(db.clone(), config.default_tax_rate()));
        let storage: Arc<dyn ProofStorage> = Arc::new(LocalProofStorage::new(
            &config.storage.proofs_dir,
            config.storage.public_base_url.clone(),
        ));

        Ok(AppContext {
            config,
            db,
            cart,
            tax,
            storage,
        })
    }

    pub async fn checkout(&self, user_id: Option<String>) -> Result<CheckoutSession, ApiError> {
        CheckoutSession::start(self.db.clone(), self.cart.clone(), self.tax.clone(), user_id).await
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.db.clone(), self.storage.clone())
    }

    /// Outbox processor posting to the configured invoice endpoint.
    pub fn invoice_processor(&self) -> Result<(OutboxProcessor, OutboxProcessorHandle), ApiError> {
        let transport = Arc::new(HttpInvoiceTransport::new(&self.config.notify)?);
        Ok(OutboxProcessor::new(
            self.db.clone(),
            Arc::new(self.config.notify.clone()),
            InvoiceDispatcher::new(transport),
        ))
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=shopfront_db=trace` - Trace one crate only
/// - Default: `info,shopfront=debug,storefront=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shopfront=debug,storefront=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parses the command line and runs it.
pub async fn run() -> ExitCode {
    init_tracing();

    let cli = cli::Cli::parse();
    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let body = serde_json::to_string_pretty(&e).unwrap_or_else(|_| e.to_string());
            eprintln!("{}", body);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_database_and_cart() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.database.path = dir.path().join("data").join("shop.db");
        config.cart.path = dir.path().join("cart.json");
        config.storage.proofs_dir = dir.path().join("proofs");

        let ctx = AppContext::open(config).await.unwrap();
        assert!(ctx.db.health_check().await);
        assert!(dir.path().join("data").join("shop.db").exists());
        assert_eq!(ctx.cart.total(), 0);
        assert_eq!(ctx.tax.current_rate().await.bps(), 1900);
        assert!(ctx.invoice_processor().is_ok());
    }
}
