//! # Commands Module
//!
//! Operations exposed to storefront callers (the CLI today).
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── cart.rs      ◄─── Cart manipulation, active product discounts
//! ├── checkout.rs  ◄─── CheckoutSession: draft, preview, commit
//! └── orders.rs    ◄─── OrderService: payment method, proofs, admin states
//! ```
//!
//! Every command returns `Result<T, ApiError>`; `T` and `ApiError` are both
//! serializable so callers can print or forward them as JSON.

pub mod cart;
pub mod checkout;
pub mod orders;

pub use cart::{
    active_discount, add_to_cart, clear_cart, get_cart, remove_from_cart, update_cart_item,
    CartView, ProductInput,
};
pub use checkout::{CheckoutReceipt, CheckoutSession};
pub use orders::{OrderDetails, OrderService, TransitionOutcome};
