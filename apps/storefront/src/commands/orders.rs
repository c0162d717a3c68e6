//! # Order Commands
//!
//! Payment and fulfillment operations on placed orders.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderService::pay_cash(id)                                            │
//! │     1. load order                    NOT_FOUND                         │
//! │     2. order.switch_payment_method   GUARD_VIOLATION, nothing written  │
//! │     3. orders().apply_transition     one transaction:                  │
//! │          UPDATE orders … WHERE status = from AND version = v           │
//! │          INSERT invoice_outbox       only when entering `paid`         │
//! │     4. TransitionOutcome { order, invoice_queued }                     │
//! │                                                                         │
//! │  upload_proof(id, file)                                                │
//! │     1. load order                                                      │
//! │     2. storage.upload(file)          UPLOAD_FAILED, order untouched    │
//! │     3. order.attach_proof(url)       transfer + in_review              │
//! │     4. apply_transition                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use shopfront_core::order::Transition;
use shopfront_core::{CoreError, Order, OrderItem, OrderStatus, PaymentMethod};
use shopfront_db::Database;

use crate::error::ApiError;
use crate::storage::ProofStorage;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    pub order: Order,
    pub transition: Transition,
    /// An invoice notification was queued by this transition.
    pub invoice_queued: bool,
}

pub struct OrderService {
    db: Arc<Database>,
    storage: Arc<dyn ProofStorage>,
}

impl OrderService {
    pub fn new(db: Arc<Database>, storage: Arc<dyn ProofStorage>) -> Self {
        OrderService { db, storage }
    }

    pub async fn get(&self, order_id: &str) -> Result<OrderDetails, ApiError> {
        let order = self.load(order_id).await?;
        let items = self.db.orders().get_items(order_id).await?;
        Ok(OrderDetails { order, items })
    }

    /// Orders in `state`, newest first.
    pub async fn list(&self, state: OrderStatus, limit: u32) -> Result<Vec<Order>, ApiError> {
        Ok(self.db.orders().list_by_state(state, limit).await?)
    }

    // =========================================================================
    // Buyer Operations
    // =========================================================================

    /// Rejected while a proof of payment is attached.
    pub async fn pay_cash(&self, order_id: &str) -> Result<TransitionOutcome, ApiError> {
        self.switch_payment_method(order_id, PaymentMethod::Cash).await
    }

    pub async fn pay_transfer(&self, order_id: &str) -> Result<TransitionOutcome, ApiError> {
        self.switch_payment_method(order_id, PaymentMethod::Transfer).await
    }

    async fn switch_payment_method(
        &self,
        order_id: &str,
        method: PaymentMethod,
    ) -> Result<TransitionOutcome, ApiError> {
        debug!(order_id = %order_id, ?method, "Switching payment method");
        let mut order = self.load(order_id).await?;
        let transition = order.switch_payment_method(method)?;
        self.persist(order, transition).await
    }

    /// Stores the proof, then moves the order to `in_review` as a transfer.
    ///
    /// A failed upload leaves the order as it was.
    pub async fn upload_proof(
        &self,
        order_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<TransitionOutcome, ApiError> {
        let mut order = self.load(order_id).await?;
        let url = self.storage.upload(file_name, bytes).await?;
        info!(order_id = %order_id, url = %url, "Proof of payment uploaded");

        let transition = order.attach_proof(url);
        self.persist(order, transition).await
    }

    pub async fn withdraw_proof(&self, order_id: &str) -> Result<TransitionOutcome, ApiError> {
        let mut order = self.load(order_id).await?;
        let transition = order.withdraw_proof();
        self.persist(order, transition).await
    }

    // =========================================================================
    // Administrative Operations
    // =========================================================================

    /// Sets any state. Entering `paid` from another state queues one invoice.
    pub async fn set_state(
        &self,
        order_id: &str,
        state: OrderStatus,
    ) -> Result<TransitionOutcome, ApiError> {
        let mut order = self.load(order_id).await?;
        let transition = order.set_status(state);
        self.persist(order, transition).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn load(&self, order_id: &str) -> Result<Order, ApiError> {
        self.db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    async fn persist(
        &self,
        mut order: Order,
        transition: Transition,
    ) -> Result<TransitionOutcome, ApiError> {
        let queued = self.db.orders().apply_transition(&mut order, transition).await?;
        Ok(TransitionOutcome {
            order,
            transition,
            invoice_queued: queued.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::storage::{LocalProofStorage, StorageError};
    use crate::test_support::{fixture, mug, Fixture};
    use async_trait::async_trait;

    struct BrokenStorage;

    #[async_trait]
    impl ProofStorage for BrokenStorage {
        async fn upload(&self, _file_name: &str, _bytes: &[u8]) -> Result<String, StorageError> {
            Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "bucket unreachable",
            )))
        }
    }

    async fn placed_order(fx: &Fixture) -> String {
        fx.cart.add(&mug(), 1).unwrap();
        let mut session = fx.filled_session(None).await;
        session.commit().await.unwrap().order_id
    }

    fn service(fx: &Fixture) -> OrderService {
        let storage = LocalProofStorage::new(fx.dir.path().join("proofs"), None);
        OrderService::new(fx.db.clone(), Arc::new(storage))
    }

    async fn outbox_len(fx: &Fixture, order_id: &str) -> usize {
        fx.db.invoice_outbox().list_for_order(order_id).await.unwrap().len()
    }

    #[tokio::test]
    async fn test_proof_upload_moves_to_review() {
        let fx = fixture().await;
        let id = placed_order(&fx).await;
        let orders = service(&fx);

        orders.set_state(&id, OrderStatus::Shipped).await.unwrap();
        let outcome = orders.upload_proof(&id, "receipt.png", b"img").await.unwrap();

        assert_eq!(outcome.order.status, OrderStatus::InReview);
        assert_eq!(outcome.order.payment_method, PaymentMethod::Transfer);
        assert!(outcome.order.proof_url.as_deref().unwrap().ends_with("receipt.png"));
        assert!(!outcome.invoice_queued);
    }

    #[tokio::test]
    async fn test_cash_rejected_with_proof() {
        let fx = fixture().await;
        let id = placed_order(&fx).await;
        let orders = service(&fx);
        orders.upload_proof(&id, "receipt.png", b"img").await.unwrap();
        let before = orders.get(&id).await.unwrap().order;

        let err = orders.pay_cash(&id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::GuardViolation);

        let after = orders.get(&id).await.unwrap().order;
        assert_eq!(after.status, OrderStatus::InReview);
        assert_eq!(after.payment_method, PaymentMethod::Transfer);
        assert_eq!(after.version, before.version);
    }

    #[tokio::test]
    async fn test_cash_allowed_after_withdrawing_proof() {
        let fx = fixture().await;
        let id = placed_order(&fx).await;
        let orders = service(&fx);
        orders.upload_proof(&id, "receipt.png", b"img").await.unwrap();

        let outcome = orders.withdraw_proof(&id).await.unwrap();
        assert_eq!(outcome.order.status, OrderStatus::PendingPayment);

        let outcome = orders.pay_cash(&id).await.unwrap();
        assert_eq!(outcome.order.payment_method, PaymentMethod::Cash);
        assert_eq!(outcome.order.proof_url, None);
    }

    #[tokio::test]
    async fn test_transfer_keeps_state() {
        let fx = fixture().await;
        let id = placed_order(&fx).await;
        let orders = service(&fx);
        orders.set_state(&id, OrderStatus::InReview).await.unwrap();

        let outcome = orders.pay_transfer(&id).await.unwrap();
        assert_eq!(outcome.order.status, OrderStatus::InReview);
        assert_eq!(outcome.order.payment_method, PaymentMethod::Transfer);
    }

    #[tokio::test]
    async fn test_failed_upload_leaves_order_untouched() {
        let fx = fixture().await;
        let id = placed_order(&fx).await;
        let orders = OrderService::new(fx.db.clone(), Arc::new(BrokenStorage));

        let err = orders.upload_proof(&id, "receipt.png", b"img").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UploadFailed);

        let order = orders.get(&id).await.unwrap().order;
        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert_eq!(order.proof_url, None);
        assert_eq!(order.version, 1);
    }

    #[tokio::test]
    async fn test_invoice_queued_once_on_entering_paid() {
        let fx = fixture().await;
        let id = placed_order(&fx).await;
        let orders = service(&fx);

        let review = orders.set_state(&id, OrderStatus::InReview).await.unwrap();
        let paid = orders.set_state(&id, OrderStatus::Paid).await.unwrap();
        let shipped = orders.set_state(&id, OrderStatus::Shipped).await.unwrap();

        assert!(!review.invoice_queued);
        assert!(paid.invoice_queued);
        assert!(!shipped.invoice_queued);
        assert_eq!(outbox_len(&fx, &id).await, 1);
    }

    #[tokio::test]
    async fn test_paid_to_paid_queues_nothing() {
        let fx = fixture().await;
        let id = placed_order(&fx).await;
        let orders = service(&fx);

        orders.set_state(&id, OrderStatus::Paid).await.unwrap();
        let again = orders.set_state(&id, OrderStatus::Paid).await.unwrap();

        assert!(!again.invoice_queued);
        assert_eq!(outbox_len(&fx, &id).await, 1);
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let fx = fixture().await;
        let orders = service(&fx);

        let err = orders.pay_transfer("missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_list_by_state() {
        let fx = fixture().await;
        let first = placed_order(&fx).await;
        let second = placed_order(&fx).await;
        let orders = service(&fx);
        orders.set_state(&first, OrderStatus::Cancelled).await.unwrap();

        let pending = orders.list(OrderStatus::PendingPayment, 10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second);

        let details = orders.get(&second).await.unwrap();
        assert_eq!(details.items.len(), 1);
    }
}
