//! Billing module.

use common::AggregateId;
use serde::Serialize;

use crate::order::{Money, Order};

/// A bill raised for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    /// Sequential invoice number (`INV-0001`, ...).
    pub number: String,
    pub order_id: AggregateId,
    pub amount: Money,
}

/// Bills orders and keeps the invoices it raised.
#[derive(Debug, Default)]
pub struct BillingModule {
    invoices: Vec<Invoice>,
}

impl BillingModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises an invoice for the order's amount.
    pub fn bill_order(&mut self, order: &Order) -> Invoice {
        let invoice = Invoice {
            number: format!("INV-{:04}", self.invoices.len() + 1),
            order_id: order.id,
            amount: order.amount,
        };
        tracing::info!(order_id = %order.id, amount = %order.amount, "billing order");
        self.invoices.push(invoice.clone());
        invoice
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    /// Sum of every invoice raised so far.
    pub fn total_billed(&self) -> Money {
        self.invoices.iter().map(|i| i.amount).sum()
    }
}
