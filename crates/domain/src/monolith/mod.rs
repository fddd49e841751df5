//! Billing, orders and inventory as modules of a single deployable.
//!
//! Each module owns its own state and exposes plain method calls; the
//! application flow in [`place_order`] wires them together in-process.

pub mod billing;
pub mod inventory;

pub use billing::{BillingModule, Invoice};
pub use inventory::{InventoryModule, Reservation};

use common::AggregateId;

use crate::order::{Money, Order};

/// Creates an order, bills it and reserves its items.
#[tracing::instrument(skip(billing, inventory))]
pub fn place_order(
    order_id: AggregateId,
    quantity: u32,
    amount: Money,
    billing: &mut BillingModule,
    inventory: &mut InventoryModule,
) -> Order {
    let order = Order::new(order_id, amount).with_quantity(quantity);
    tracing::info!(?order, "order created");
    billing.bill_order(&order);
    inventory.reserve(&order);
    order
}
