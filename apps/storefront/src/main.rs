//! # Storefront Binary
//!
//! Entry point of the `storefront` command. Everything lives in the
//! library so it can be tested.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    storefront_lib::run().await
}
