//! # Command Line
//!
//! ```text
//! storefront [--config <file>] [--db <file>] <command>
//!
//!   cart add --product-id <id> --name <name> --price-cents <n> [--quantity <n>]
//!   cart update <product-id> <quantity>
//!   cart remove <product-id>
//!   cart clear | cart show
//!
//!   quote    [checkout flags]          price the cart, write nothing
//!   checkout [checkout flags]          place the order
//!
//!   order show <id>
//!   order list [--state <state>] [--limit <n>]
//!   order pay-cash <id> | order pay-transfer <id>
//!   order proof <id> --file <path> | order withdraw-proof <id>
//!   order set-state <id> <state>
//!
//!   dispatch-invoices [--once]         drain the invoice outbox
//! ```
//!
//! Results are printed to stdout as JSON; errors go to stderr as an
//! `ApiError`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use shopfront_core::{OrderStatus, PaymentMethod};

use crate::commands::{self, CheckoutSession, ProductInput};
use crate::error::{ApiError, ErrorCode};
use crate::state::AppConfig;
use crate::AppContext;

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Shopfront order pricing and fulfillment", long_about = None)]
pub struct Cli {
    /// Config file (defaults to storefront.toml in the platform config dir)
    #[arg(long, global = true, env = "SHOPFRONT_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file, overriding the configuration
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect or change the cart
    #[command(subcommand)]
    Cart(CartCommand),

    /// Price the cart with the given selections
    Quote(CheckoutArgs),

    /// Place an order from the cart
    Checkout(CheckoutArgs),

    /// Payment and fulfillment of placed orders
    #[command(subcommand)]
    Order(OrderCommand),

    /// Send pending invoice notifications
    DispatchInvoices(DispatchArgs),
}

#[derive(Debug, Subcommand)]
enum CartCommand {
    Add {
        #[arg(long)]
        product_id: String,
        #[arg(long)]
        name: String,
        /// Tax-inclusive catalog price in cents
        #[arg(long)]
        price_cents: i64,
        /// Negative values decrement
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
    },
    Update {
        product_id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    Remove {
        product_id: String,
    },
    Clear,
    Show,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PaymentArg {
    Cash,
    Transfer,
}

impl From<PaymentArg> for PaymentMethod {
    fn from(arg: PaymentArg) -> Self {
        match arg {
            PaymentArg::Cash => PaymentMethod::Cash,
            PaymentArg::Transfer => PaymentMethod::Transfer,
        }
    }
}

/// Checkout form fields. Unset fields keep the stored profile's values.
#[derive(Debug, Args)]
struct CheckoutArgs {
    /// Signed-in buyer; omit for a guest checkout
    #[arg(long)]
    user: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    surname: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    street: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    postal_code: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    region: Option<String>,
    /// Shipping method id
    #[arg(long)]
    shipping: Option<String>,
    #[arg(long)]
    coupon: Option<String>,
    #[arg(long, value_enum)]
    payment: Option<PaymentArg>,
    /// Key of an earlier attempt whose outcome is unknown
    #[arg(long)]
    submission_key: Option<String>,
}

#[derive(Debug, Subcommand)]
enum OrderCommand {
    Show {
        order_id: String,
    },
    List {
        #[arg(long, default_value = "pending_payment")]
        state: OrderStatus,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    PayCash {
        order_id: String,
    },
    PayTransfer {
        order_id: String,
    },
    /// Upload a transfer receipt
    Proof {
        order_id: String,
        #[arg(long)]
        file: PathBuf,
    },
    WithdrawProof {
        order_id: String,
    },
    /// Administrative state change
    SetState {
        order_id: String,
        state: OrderStatus,
    },
}

#[derive(Debug, Args)]
struct DispatchArgs {
    /// Process one batch and exit instead of polling until Ctrl-C
    #[arg(long)]
    once: bool,
}

#[derive(Serialize)]
struct DispatchReport {
    sent: usize,
    failed: usize,
    pending: i64,
}

impl Cli {
    pub async fn run(self) -> Result<(), ApiError> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        if let Some(db) = self.db {
            config.database.path = db;
        }
        let ctx = AppContext::open(config).await?;

        match self.command {
            Commands::Cart(command) => run_cart(&ctx, command).await,
            Commands::Quote(args) => {
                let session = prepare_session(&ctx, args).await?;
                print_json(&session.preview().await?)
            }
            Commands::Checkout(args) => {
                let mut session = prepare_session(&ctx, args).await?;
                info!(submission_key = %session.submission_key(), "Submitting checkout");
                print_json(&session.commit().await?)
            }
            Commands::Order(command) => run_order(&ctx, command).await,
            Commands::DispatchInvoices(args) => run_dispatch(&ctx, args).await,
        }
    }
}

async fn run_cart(ctx: &AppContext, command: CartCommand) -> Result<(), ApiError> {
    let view = match command {
        CartCommand::Add {
            product_id,
            name,
            price_cents,
            quantity,
        } => {
            let product = ProductInput {
                id: product_id,
                name,
                price_cents,
            };
            commands::add_to_cart(&ctx.db, &ctx.cart, product, quantity).await?
        }
        CartCommand::Update {
            product_id,
            quantity,
        } => commands::update_cart_item(&ctx.cart, &product_id, quantity)?,
        CartCommand::Remove { product_id } => commands::remove_from_cart(&ctx.cart, &product_id)?,
        CartCommand::Clear => commands::clear_cart(&ctx.cart)?,
        CartCommand::Show => commands::get_cart(&ctx.cart),
    };
    print_json(&view)
}

async fn prepare_session(ctx: &AppContext, args: CheckoutArgs) -> Result<CheckoutSession, ApiError> {
    let mut session = ctx.checkout(args.user).await?;
    if let Some(key) = args.submission_key {
        session = session.with_submission_key(key);
    }

    let mut customer = session.draft().customer().clone();
    if let Some(name) = args.name {
        customer.name = name;
    }
    if let Some(surname) = args.surname {
        customer.surname = surname;
    }
    if let Some(email) = args.email {
        customer.email = email;
    }
    if args.phone.is_some() {
        customer.phone = args.phone;
    }
    session.set_customer(customer);

    let mut address = session.draft().address().clone();
    if let Some(street) = args.street {
        address.street = street;
    }
    if let Some(city) = args.city {
        address.city = city;
    }
    if let Some(postal_code) = args.postal_code {
        address.postal_code = postal_code;
    }
    if let Some(country) = args.country {
        address.country = country;
    }
    if args.region.is_some() {
        address.region = args.region;
    }
    session.set_address(address);

    if let Some(shipping) = args.shipping {
        session.select_shipping(shipping);
    }
    if let Some(code) = args.coupon {
        session.apply_coupon_code(&code);
    }
    if let Some(payment) = args.payment {
        session.select_payment_method(payment.into());
    }
    Ok(session)
}

async fn run_order(ctx: &AppContext, command: OrderCommand) -> Result<(), ApiError> {
    let orders = ctx.orders();
    match command {
        OrderCommand::Show { order_id } => print_json(&orders.get(&order_id).await?),
        OrderCommand::List { state, limit } => print_json(&orders.list(state, limit).await?),
        OrderCommand::PayCash { order_id } => print_json(&orders.pay_cash(&order_id).await?),
        OrderCommand::PayTransfer { order_id } => {
            print_json(&orders.pay_transfer(&order_id).await?)
        }
        OrderCommand::Proof { order_id, file } => {
            let bytes = tokio::fs::read(&file).await.map_err(|e| {
                ApiError::new(
                    ErrorCode::UploadFailed,
                    format!("Failed to read {}: {}", file.display(), e),
                )
            })?;
            let file_name = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "proof".to_string());
            print_json(&orders.upload_proof(&order_id, &file_name, &bytes).await?)
        }
        OrderCommand::WithdrawProof { order_id } => {
            print_json(&orders.withdraw_proof(&order_id).await?)
        }
        OrderCommand::SetState { order_id, state } => {
            print_json(&orders.set_state(&order_id, state).await?)
        }
    }
}

async fn run_dispatch(ctx: &AppContext, args: DispatchArgs) -> Result<(), ApiError> {
    let (processor, handle) = ctx.invoice_processor()?;

    if args.once {
        let report = processor.process_batch().await?;
        let pending = ctx.db.invoice_outbox().count_pending().await?;
        return print_json(&DispatchReport {
            sent: report.sent,
            failed: report.failed,
            pending,
        });
    }

    let task = tokio::spawn(processor.run());
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to listen for Ctrl-C: {}", e)))?;

    info!("Ctrl-C received, stopping invoice dispatch");
    handle.shutdown().await?;
    task.await
        .map_err(|e| ApiError::internal(format!("Invoice dispatch task failed: {}", e)))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ApiError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::internal(format!("Failed to serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}
