//! Event-sourced order lifecycle aggregate.

use common::AggregateId;
use event_store::Version;

use crate::aggregate::Aggregate;

use super::{OrderError, OrderEvent, OrderState, ProductId};

/// An order as reconstructed from its journal.
#[derive(Debug, Clone, Default)]
pub struct OrderLifecycle {
    id: Option<AggregateId>,
    version: Version,
    item: Option<ProductId>,
    state: OrderState,
}

impl Aggregate for OrderLifecycle {
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            OrderEvent::OrderCreated(data) => {
                self.id = Some(data.order_id);
                self.item = Some(data.item);
                self.state = OrderState::Created;
            }
            OrderEvent::OrderShipped(_) => {
                self.state = OrderState::Shipped;
            }
        }
    }
}

impl OrderLifecycle {
    /// Returns the current state.
    pub fn state(&self) -> OrderState {
        self.state
    }

    /// Returns the ordered item.
    pub fn item(&self) -> Option<&ProductId> {
        self.item.as_ref()
    }

    /// Records the creation of the order.
    pub fn create(
        &self,
        order_id: AggregateId,
        item: ProductId,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyCreated);
        }

        Ok(vec![OrderEvent::order_created(order_id, item)])
    }

    /// Records the shipment of the order.
    pub fn ship(&self) -> Result<Vec<OrderEvent>, OrderError> {
        let Some(order_id) = self.id else {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.state,
                action: "ship an uncreated order",
            });
        };

        if !self.state.can_ship() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.state,
                action: "ship",
            });
        }

        Ok(vec![OrderEvent::order_shipped(order_id)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(id: u64, item: &str) -> OrderLifecycle {
        let mut order = OrderLifecycle::default();
        let events = order.create(AggregateId::new(id), item.into()).unwrap();
        order.apply_events(events);
        order
    }

    #[test]
    fn create_sets_id_and_item() {
        let order = created(1, "Book");
        assert_eq!(order.id(), Some(AggregateId::new(1)));
        assert_eq!(order.item().map(ProductId::as_str), Some("Book"));
        assert_eq!(order.state(), OrderState::Created);
    }

    #[test]
    fn create_twice_is_rejected() {
        let order = created(1, "Book");
        assert!(matches!(
            order.create(AggregateId::new(1), "Book".into()),
            Err(OrderError::AlreadyCreated)
        ));
    }

    #[test]
    fn ship_moves_to_shipped() {
        let mut order = created(1, "Book");
        let events = order.ship().unwrap();
        order.apply_events(events);
        assert_eq!(order.state(), OrderState::Shipped);
    }

    #[test]
    fn ship_twice_is_rejected() {
        let mut order = created(1, "Book");
        let events = order.ship().unwrap();
        order.apply_events(events);

        assert!(matches!(
            order.ship(),
            Err(OrderError::InvalidStateTransition {
                current_state: OrderState::Shipped,
                ..
            })
        ));
    }

    #[test]
    fn ship_before_create_is_rejected() {
        let order = OrderLifecycle::default();
        assert!(matches!(
            order.ship(),
            Err(OrderError::InvalidStateTransition { .. })
        ));
    }
}
