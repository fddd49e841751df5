//! Payment service trait and in-memory implementation.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use common::AggregateId;
use domain::Money;

use super::ServiceError;

/// A successful charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// The payment ID assigned by the payment service.
    pub payment_id: String,
    /// The amount charged.
    pub amount: Money,
}

/// Trait for payment processing operations.
pub trait PaymentService: Send + Sync {
    /// Charges an order.
    ///
    /// An order holds at most one active payment; charging it again before a
    /// refund fails with [`ServiceError::AlreadyCharged`].
    fn charge(&self, order_id: AggregateId, amount: Money) -> Result<PaymentReceipt, ServiceError>;

    /// Refunds the payment taken for an order.
    ///
    /// Returns the refunded receipt, or None if nothing was charged.
    fn refund(&self, order_id: AggregateId) -> Option<PaymentReceipt>;
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    payments: BTreeMap<AggregateId, PaymentReceipt>,
    refunds: Vec<PaymentReceipt>,
    next_id: u32,
    fail_on_charge: bool,
}

/// In-memory payment ledger. Clones share the same ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentService {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentService {
    /// Creates a new in-memory payment service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following charge fail until reset.
    pub fn set_fail_on_charge(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_charge = fail;
    }

    /// Returns the number of payments that have not been refunded.
    pub fn payment_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .payments
            .len()
    }

    /// Returns the active payment for an order.
    pub fn payment_for(&self, order_id: AggregateId) -> Option<PaymentReceipt> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .payments
            .get(&order_id)
            .cloned()
    }

    /// Returns every refund issued, oldest first.
    pub fn refunds(&self) -> Vec<PaymentReceipt> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .refunds
            .clone()
    }
}

impl PaymentService for InMemoryPaymentService {
    fn charge(&self, order_id: AggregateId, amount: Money) -> Result<PaymentReceipt, ServiceError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if state.fail_on_charge {
            return Err(ServiceError::PaymentDeclined);
        }
        if state.payments.contains_key(&order_id) {
            return Err(ServiceError::AlreadyCharged(order_id));
        }

        state.next_id += 1;
        let receipt = PaymentReceipt {
            payment_id: format!("PAY-{:04}", state.next_id),
            amount,
        };
        state.payments.insert(order_id, receipt.clone());
        tracing::info!(%order_id, payment_id = %receipt.payment_id, %amount, "payment charged");

        Ok(receipt)
    }

    fn refund(&self, order_id: AggregateId) -> Option<PaymentReceipt> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let receipt = state.payments.remove(&order_id)?;
        state.refunds.push(receipt.clone());
        tracing::info!(%order_id, payment_id = %receipt.payment_id, "payment refunded");
        Some(receipt)
    }
}
