//! # Order State Machine
//!
//! Guarded lifecycle of a placed order. Every operation mutates the
//! in-memory [`Order`] and reports the [`Transition`] it made; persisting it
//! (and emitting the invoice outbox row) is the caller's job.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Buyer                                                                  │
//! │  ─────                                                                  │
//! │  switch_payment_method(Cash)      proof present? ──► CashWithProof      │
//! │                                   else ──► cash, proof cleared,         │
//! │                                            status = pending_payment     │
//! │  switch_payment_method(Transfer)  method only, status unchanged         │
//! │  attach_proof(url)                transfer, proof = url,                │
//! │                                   status = in_review (from any state)   │
//! │  withdraw_proof()                 proof cleared; in_review ──►          │
//! │                                   pending_payment                       │
//! │                                                                         │
//! │  Administrator                                                          │
//! │  ─────────────                                                          │
//! │  set_status(s)                    any state ──► s, no guard             │
//! │                                                                         │
//! │  Side effect                                                            │
//! │  ───────────                                                            │
//! │  Transition { from ≠ paid, to = paid }  ──► one invoice dispatch       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{Order, OrderStatus, PaymentMethod};

// =============================================================================
// Transition
// =============================================================================

/// A status change produced by one state machine operation.
///
/// `from == to` when the operation only touched payment fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl Transition {
    pub const fn new(from: OrderStatus, to: OrderStatus) -> Self {
        Self { from, to }
    }

    /// True exactly when the order enters `paid` from another state.
    pub fn dispatches_invoice(&self) -> bool {
        self.to == OrderStatus::Paid && self.from != OrderStatus::Paid
    }

    pub fn changes_status(&self) -> bool {
        self.from != self.to
    }
}

// =============================================================================
// Order Operations
// =============================================================================

impl Order {
    /// Buyer chooses how to pay.
    ///
    /// ## Errors
    /// `CashWithProof` when switching to cash while a proof of payment is
    /// attached. The order is left untouched.
    pub fn switch_payment_method(&mut self, method: PaymentMethod) -> CoreResult<Transition> {
        let from = self.status;
        match method {
            PaymentMethod::Cash => {
                if self.proof_url.is_some() {
                    return Err(CoreError::CashWithProof {
                        order_id: self.id.clone(),
                    });
                }
                self.payment_method = PaymentMethod::Cash;
                self.proof_url = None;
                self.status = OrderStatus::PendingPayment;
            }
            PaymentMethod::Transfer => {
                self.payment_method = PaymentMethod::Transfer;
            }
        }
        Ok(Transition::new(from, self.status))
    }

    /// Buyer uploaded a transfer receipt.
    ///
    /// Applies from any prior state.
    pub fn attach_proof(&mut self, proof_url: impl Into<String>) -> Transition {
        let from = self.status;
        self.payment_method = PaymentMethod::Transfer;
        self.proof_url = Some(proof_url.into());
        self.status = OrderStatus::InReview;
        Transition::new(from, self.status)
    }

    /// Buyer removes an uploaded proof, e.g. to pay in cash instead.
    ///
    /// An order waiting for review goes back to `pending_payment`; any
    /// other status is kept.
    pub fn withdraw_proof(&mut self) -> Transition {
        let from = self.status;
        self.proof_url = None;
        if self.status == OrderStatus::InReview {
            self.status = OrderStatus::PendingPayment;
        }
        Transition::new(from, self.status)
    }

    /// Administrator sets any status.
    pub fn set_status(&mut self, status: OrderStatus) -> Transition {
        let from = self.status;
        self.status = status;
        Transition::new(from, status)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
