//! # State Module
//!
//! Long-lived state shared by the storefront commands.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐          │
//! │  │  AppConfig   │  │  TaxConfigState  │  │    CartStore     │          │
//! │  │              │  │                  │  │                  │          │
//! │  │  defaults    │  │  OnceCell<       │  │  Mutex<Cart>     │          │
//! │  │  + TOML      │  │    TaxRate>      │  │  + cart.json     │          │
//! │  │  + env       │  │                  │  │                  │          │
//! │  └──────────────┘  └──────────────────┘  └──────────────────┘          │
//! │                                                                         │
//! │  AppConfig: read-only after load                                       │
//! │  TaxConfigState: loaded once, then read-only                           │
//! │  CartStore: single writer under the Mutex                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;
mod tax;

pub use cart::CartStore;
pub use config::{
    AppConfig, CartSection, ConfigError, ConfigResult, DatabaseSection, StorageSection,
    TaxSection,
};
pub use tax::TaxConfigState;
