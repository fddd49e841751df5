//! Inventory module.

use std::collections::BTreeMap;

use common::AggregateId;
use serde::Serialize;

use crate::order::Order;

/// Units held back for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reservation {
    pub order_id: AggregateId,
    /// Total units now held for the order.
    pub quantity: u64,
}

/// Tracks reserved units per order.
#[derive(Debug, Default)]
pub struct InventoryModule {
    reserved: BTreeMap<AggregateId, u64>,
}

impl InventoryModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the order's quantity. Reserving again for the same order
    /// adds to the existing reservation, saturating at `u64::MAX`.
    pub fn reserve(&mut self, order: &Order) -> Reservation {
        let held = self.reserved.entry(order.id).or_insert(0);
        *held = held.saturating_add(u64::from(order.quantity));
        tracing::info!(order_id = %order.id, quantity = order.quantity, "reserved items");
        Reservation {
            order_id: order.id,
            quantity: *held,
        }
    }

    /// Units currently held for an order.
    pub fn reserved_for(&self, order_id: AggregateId) -> u64 {
        self.reserved.get(&order_id).copied().unwrap_or(0)
    }

    pub fn total_reserved(&self) -> u64 {
        self.reserved
            .values()
            .fold(0, |total, held| total.saturating_add(*held))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Money;

    #[test]
    fn reservations_accumulate_per_order() {
        let mut inventory = InventoryModule::new();
        let order = Order::new(1, Money::zero()).with_quantity(5);

        inventory.reserve(&order);
        let reservation = inventory.reserve(&order);

        assert_eq!(reservation.quantity, 10);
        assert_eq!(inventory.reserved_for(AggregateId::new(1)), 10);
        assert_eq!(inventory.reserved_for(AggregateId::new(2)), 0);
        assert_eq!(inventory.total_reserved(), 10);
    }

    #[test]
    fn repeated_large_reservations_do_not_overflow() {
        let mut inventory = InventoryModule::new();
        let order = Order::new(1, Money::zero()).with_quantity(u32::MAX);

        inventory.reserve(&order);
        let reservation = inventory.reserve(&order);
        inventory.reserve(&Order::new(2, Money::zero()).with_quantity(u32::MAX));

        assert_eq!(reservation.quantity, 2 * u64::from(u32::MAX));
        assert_eq!(inventory.total_reserved(), 3 * u64::from(u32::MAX));
    }

    #[test]
    fn reservations_saturate() {
        let mut inventory = InventoryModule::new();
        inventory.reserved.insert(AggregateId::new(1), u64::MAX - 1);
        inventory.reserved.insert(AggregateId::new(2), 5);

        let reservation = inventory.reserve(&Order::new(1, Money::zero()).with_quantity(10));

        assert_eq!(reservation.quantity, u64::MAX);
        assert_eq!(inventory.total_reserved(), u64::MAX);
    }
}
