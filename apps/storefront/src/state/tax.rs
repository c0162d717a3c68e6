//! # Tax Rate State
//!
//! The store-wide tax rate, read from `tax_config` once per process.

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use shopfront_core::validation::validate_tax_rate_bps;
use shopfront_core::TaxRate;
use shopfront_db::{Database, DbResult};

pub struct TaxConfigState {
    db: Arc<Database>,
    default_rate: TaxRate,
    cell: OnceCell<TaxRate>,
}

impl TaxConfigState {
    pub fn new(db: Arc<Database>, default_rate: TaxRate) -> Self {
        TaxConfigState {
            db,
            default_rate,
            cell: OnceCell::new(),
        }
    }

    /// Returns the rate, loading it on first use.
    ///
    /// A missing row or an out-of-range value yields the default and is
    /// cached. A database error yields the default without caching, so the
    /// next call tries again.
    pub async fn current_rate(&self) -> TaxRate {
        match self.cell.get_or_try_init(|| self.load()).await {
            Ok(rate) => *rate,
            Err(e) => {
                warn!(error = %e, "Failed to load tax rate, using default");
                self.default_rate
            }
        }
    }

    async fn load(&self) -> DbResult<TaxRate> {
        let rate = match self.db.tax_config().get_rate_bps().await? {
            Some(bps) => match validate_tax_rate_bps(bps) {
                Ok(()) => TaxRate::from_bps(bps as u32),
                Err(e) => {
                    warn!(rate_bps = bps, error = %e, "Stored tax rate unusable, using default");
                    self.default_rate
                }
            },
            None => {
                debug!("No tax rate configured, using default");
                self.default_rate
            }
        };
        debug!(rate_bps = rate.bps(), "Tax rate loaded");
        Ok(rate)
    }
}
