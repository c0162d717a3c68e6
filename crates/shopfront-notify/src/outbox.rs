//! # Outbox Processor
//!
//! Drains the `invoice_outbox` table through the [`InvoiceDispatcher`].
//!
//! ## Processing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    invoice_outbox Table                                 │
//! │                                                                         │
//! │  id | order_id  | attachment | attempts | last_error | sent_at          │
//! │  ───┼───────────┼────────────┼──────────┼────────────┼────────          │
//! │  1  │ order-001 │ https://.. │ 0        │ NULL       │ NULL             │
//! │  2  │ order-002 │ NULL       │ 3        │ HTTP 503   │ NULL             │
//! │                               │                                         │
//! │                               ▼                                         │
//! │  OutboxProcessor (every poll_interval_secs)                             │
//! │    1. SELECT … WHERE sent_at IS NULL AND attempts < max_attempts        │
//! │       ORDER BY created_at LIMIT batch_size                              │
//! │    2. dispatcher.deliver(order_id, attachment)                          │
//! │    3. ok  → mark_sent                                                   │
//! │       err → mark_failed (attempts += 1, last_error)                     │
//! │                                                                         │
//! │  Order rows are never read or written here.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use shopfront_db::Database;

use crate::config::NotifyConfig;
use crate::dispatcher::InvoiceDispatcher;
use crate::error::{NotifyError, NotifyResult};

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub sent: usize,
    pub failed: usize,
}

pub struct OutboxProcessor {
    db: Arc<Database>,
    config: Arc<NotifyConfig>,
    dispatcher: InvoiceDispatcher,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping a running processor.
#[derive(Clone)]
pub struct OutboxProcessorHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl OutboxProcessorHandle {
    pub async fn shutdown(&self) -> NotifyResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| NotifyError::ChannelError("Shutdown channel closed".into()))
    }
}

impl OutboxProcessor {
    pub fn new(
        db: Arc<Database>,
        config: Arc<NotifyConfig>,
        dispatcher: InvoiceDispatcher,
    ) -> (Self, OutboxProcessorHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let processor = OutboxProcessor {
            db,
            config,
            dispatcher,
            shutdown_rx,
        };

        (processor, OutboxProcessorHandle { shutdown_tx })
    }

    /// Runs the poll loop until shut down. Spawn it as a background task.
    pub async fn run(mut self) {
        info!(
            interval_secs = self.config.poll_interval_secs,
            batch_size = self.config.batch_size,
            "Outbox processor starting"
        );

        let mut interval = tokio::time::interval(self.config.poll_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.process_batch().await {
                        error!(?e, "Failed to process invoice outbox batch");
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Outbox processor shutting down");
                    break;
                }
            }
        }

        info!("Outbox processor stopped");
    }

    /// Delivers one batch of pending entries.
    pub async fn process_batch(&self) -> NotifyResult<BatchReport> {
        let outbox = self.db.invoice_outbox();
        let entries = outbox
            .get_pending(self.config.batch_size, self.config.max_attempts)
            .await?;

        if entries.is_empty() {
            debug!("No pending invoices");
            return Ok(BatchReport::default());
        }

        info!(count = entries.len(), "Processing invoice outbox batch");

        let mut report = BatchReport::default();
        for entry in entries {
            match self
                .dispatcher
                .deliver(&entry.order_id, entry.attachment.as_deref())
                .await
            {
                Ok(()) => {
                    outbox.mark_sent(&entry.id).await?;
                    report.sent += 1;
                }
                Err(e) => {
                    outbox.mark_failed(&entry.id, &e.to_string()).await?;
                    report.failed += 1;

                    if entry.attempts + 1 >= self.config.max_attempts {
                        error!(
                            id = %entry.id,
                            order_id = %entry.order_id,
                            attempts = entry.attempts + 1,
                            error = %e,
                            "Giving up on invoice after max attempts"
                        );
                    } else {
                        warn!(
                            id = %entry.id,
                            order_id = %entry.order_id,
                            attempts = entry.attempts + 1,
                            error = %e,
                            "Invoice delivery failed, will retry"
                        );
                    }
                }
            }
        }

        Ok(report)
    }
}

// =============================================================================
// Tests
// =============================================================================
