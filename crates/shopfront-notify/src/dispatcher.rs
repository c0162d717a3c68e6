//! # Invoice Dispatcher
//!
//! Sends the invoice notification for a paid order. A failed notification
//! never affects the order: the transition into `paid` has already been
//! committed by the time anything here runs.

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::NotifyResult;
use crate::transport::{InvoiceRequest, InvoiceTransport};

#[derive(Clone)]
pub struct InvoiceDispatcher {
    transport: Arc<dyn InvoiceTransport>,
}

impl InvoiceDispatcher {
    pub fn new(transport: Arc<dyn InvoiceTransport>) -> Self {
        InvoiceDispatcher { transport }
    }

    /// Sends the notification and reports the outcome.
    ///
    /// Used by the outbox processor, which records failures for retry.
    pub async fn deliver(&self, order_id: &str, attachment: Option<&str>) -> NotifyResult<()> {
        let request = InvoiceRequest::new(order_id, attachment.map(str::to_string));
        self.transport.send(&request).await?;
        info!(order_id = %order_id, "Invoice dispatched");
        Ok(())
    }

    /// Fire-and-forget: a failure is logged as a warning and swallowed.
    ///
    /// Library entry point for callers that notify outside the outbox, such
    /// as an embedding service resending an invoice by hand. The storefront
    /// itself always goes through `OutboxProcessor`.
    ///
    /// Returns whether the notification went through.
    pub async fn dispatch(&self, order_id: &str, attachment: Option<&str>) -> bool {
        match self.deliver(order_id, attachment).await {
            Ok(()) => true,
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Invoice dispatch failed");
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::NotifyError;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    /// Records every request; fails the first `failures` of them.
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub(crate) sent: Mutex<Vec<InvoiceRequest>>,
        failures: Mutex<usize>,
    }

    impl RecordingTransport {
        pub(crate) fn failing(failures: usize) -> Self {
            RecordingTransport {
                sent: Mutex::new(Vec::new()),
                failures: Mutex::new(failures),
            }
        }
    }

    #[async_trait]
    impl InvoiceTransport for RecordingTransport {
        async fn send(&self, request: &InvoiceRequest) -> NotifyResult<()> {
            let mut failures = self.failures.lock().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(NotifyError::Unavailable { status: 503 });
            }
            self.sent.lock().await.push(request.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_deliver_sends_order_id() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = InvoiceDispatcher::new(transport.clone());

        dispatcher.deliver("order-1", Some("proof.png")).await.unwrap();

        let sent = transport.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].order_id, "order-1");
        assert_eq!(sent[0].attachment.as_deref(), Some("proof.png"));
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failure() {
        let transport = Arc::new(RecordingTransport::failing(1));
        let dispatcher = InvoiceDispatcher::new(transport.clone());

        assert!(!dispatcher.dispatch("order-1", None).await);
        assert!(transport.sent.lock().await.is_empty());

        assert!(dispatcher.dispatch("order-1", None).await);
        assert_eq!(transport.sent.lock().await.len(), 1);
    }
}
