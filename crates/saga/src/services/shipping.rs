//! Shipping service trait and in-memory implementation.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use common::AggregateId;

use super::ServiceError;

/// A created shipment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentReceipt {
    /// The tracking number assigned by the shipping service.
    pub tracking_number: String,
}

/// Trait for shipping operations.
pub trait ShippingService: Send + Sync {
    /// Creates a shipment for an order.
    ///
    /// Fails with [`ServiceError::AlreadyShipped`] while an earlier shipment
    /// for the same order is still active.
    fn create_shipment(&self, order_id: AggregateId) -> Result<ShipmentReceipt, ServiceError>;

    /// Cancels the shipment created for an order.
    ///
    /// Returns the cancelled shipment, or None if there was none.
    fn cancel_shipment(&self, order_id: AggregateId) -> Option<ShipmentReceipt>;
}

#[derive(Debug, Default)]
struct InMemoryShippingState {
    shipments: BTreeMap<AggregateId, ShipmentReceipt>,
    cancelled: Vec<ShipmentReceipt>,
    next_id: u32,
    fail_on_create: bool,
}

/// In-memory shipping ledger. Clones share the same ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShippingService {
    state: Arc<RwLock<InMemoryShippingState>>,
}

impl InMemoryShippingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following shipment fail until reset.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_create = fail;
    }

    /// Returns the number of active shipments.
    pub fn shipment_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .shipments
            .len()
    }

    /// Returns the active shipment for an order.
    pub fn shipment_for(&self, order_id: AggregateId) -> Option<ShipmentReceipt> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .shipments
            .get(&order_id)
            .cloned()
    }

    /// Returns every cancelled shipment, oldest first.
    pub fn cancelled(&self) -> Vec<ShipmentReceipt> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cancelled
            .clone()
    }
}

impl ShippingService for InMemoryShippingService {
    fn create_shipment(&self, order_id: AggregateId) -> Result<ShipmentReceipt, ServiceError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if state.fail_on_create {
            return Err(ServiceError::ShippingUnavailable);
        }
        if state.shipments.contains_key(&order_id) {
            return Err(ServiceError::AlreadyShipped(order_id));
        }

        state.next_id += 1;
        let receipt = ShipmentReceipt {
            tracking_number: format!("TRACK-{:04}", state.next_id),
        };
        state.shipments.insert(order_id, receipt.clone());
        tracing::info!(%order_id, tracking_number = %receipt.tracking_number, "shipment created");

        Ok(receipt)
    }

    fn cancel_shipment(&self, order_id: AggregateId) -> Option<ShipmentReceipt> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let receipt = state.shipments.remove(&order_id)?;
        state.cancelled.push(receipt.clone());
        tracing::info!(%order_id, tracking_number = %receipt.tracking_number, "shipment cancelled");
        Some(receipt)
    }
}
