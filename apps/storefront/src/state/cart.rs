//! # Cart Store
//!
//! The buyer's cart with a durable JSON backing file.
//!
//! ## Persistence Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Operations                                │
//! │                                                                         │
//! │  startup ──► CartStore::open(path)                                     │
//! │                ├── file missing  ──► empty cart                        │
//! │                ├── file corrupt  ──► warn!, empty cart                 │
//! │                └── file ok       ──► restored cart                     │
//! │                                                                         │
//! │  add / set_quantity / remove / clear                                   │
//! │     1. lock the Mutex                                                  │
//! │     2. mutate the in-memory Cart                                       │
//! │     3. write {path}.tmp, rename over {path}                            │
//! │                                                                         │
//! │  snapshot / total / items_total  (read only)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A mutation that fails validation leaves both memory and file untouched.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use shopfront_core::cart::{Cart, CartProduct};
use shopfront_core::Money;

use crate::error::ApiError;

#[derive(Debug)]
pub struct CartStore {
    path: PathBuf,
    cart: Mutex<Cart>,
}

impl CartStore {
    /// Restores the cart stored at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cart = Self::restore(&path);
        debug!(?path, lines = cart.lines().len(), "Cart restored");
        CartStore {
            path,
            cart: Mutex::new(cart),
        }
    }

    fn restore(path: &Path) -> Cart {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Cart::new(),
            Err(e) => {
                warn!(?path, error = %e, "Failed to read cart file, starting empty");
                return Cart::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(?path, error = %e, "Cart file is corrupt, starting empty");
            Cart::new()
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.lock();
        f(&cart)
    }

    /// Runs `f` on a working copy and, when it succeeds, persists the copy
    /// and makes it current.
    fn mutate<F, R>(&self, f: F) -> Result<R, ApiError>
    where
        F: FnOnce(&mut Cart) -> Result<R, ApiError>,
    {
        let mut guard = self.lock();
        let mut working = guard.clone();
        let result = f(&mut working)?;
        self.persist(&working)?;
        *guard = working;
        Ok(result)
    }

    fn persist(&self, cart: &Cart) -> Result<(), ApiError> {
        let json = serde_json::to_vec_pretty(cart)
            .map_err(|e| ApiError::internal(format!("Failed to serialize cart: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ApiError::cart(format!("Failed to create cart directory: {}", e))
                })?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| ApiError::cart(format!("Failed to save cart: {}", e)))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds `quantity` of `product`; a negative quantity decrements.
    pub fn add(&self, product: &CartProduct, quantity: i64) -> Result<Cart, ApiError> {
        self.mutate(|cart| {
            cart.add(product, quantity)?;
            Ok(cart.clone())
        })
    }

    /// Sets a line's quantity; zero or less removes it.
    pub fn set_quantity(&self, product_id: &str, quantity: i64) -> Result<Cart, ApiError> {
        self.mutate(|cart| {
            if !cart.set_quantity(product_id, quantity)? {
                return Err(ApiError::cart(format!("Product {} not in cart", product_id)));
            }
            Ok(cart.clone())
        })
    }

    /// Returns whether the product was in the cart.
    pub fn remove(&self, product_id: &str) -> Result<bool, ApiError> {
        self.mutate(|cart| Ok(cart.remove(product_id)))
    }

    pub fn clear(&self) -> Result<(), ApiError> {
        self.mutate(|cart| {
            cart.clear();
            Ok(())
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn snapshot(&self) -> Cart {
        self.with_cart(Cart::clone)
    }

    /// Item count.
    pub fn total(&self) -> i64 {
        self.with_cart(Cart::total)
    }

    pub fn items_total(&self) -> Money {
        self.with_cart(Cart::items_total)
    }
}
