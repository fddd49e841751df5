//! Order domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::ProductId;

/// Events recorded in an order's journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was created for an item.
    OrderCreated(OrderCreatedData),

    /// Order was shipped.
    OrderShipped(OrderShippedData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "OrderCreated",
            OrderEvent::OrderShipped(_) => "OrderShipped",
        }
    }
}

/// Data for OrderCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedData {
    /// The order ID.
    pub order_id: AggregateId,

    /// The ordered item.
    pub item: ProductId,

    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

/// Data for OrderShipped event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderShippedData {
    /// The order ID.
    pub order_id: AggregateId,

    /// When the order was shipped.
    pub shipped_at: DateTime<Utc>,
}

impl OrderEvent {
    /// Creates an OrderCreated event.
    pub fn order_created(order_id: AggregateId, item: impl Into<ProductId>) -> Self {
        OrderEvent::OrderCreated(OrderCreatedData {
            order_id,
            item: item.into(),
            created_at: Utc::now(),
        })
    }

    /// Creates an OrderShipped event.
    pub fn order_shipped(order_id: AggregateId) -> Self {
        OrderEvent::OrderShipped(OrderShippedData {
            order_id,
            shipped_at: Utc::now(),
        })
    }

    /// Returns the order this event belongs to.
    pub fn order_id(&self) -> AggregateId {
        match self {
            OrderEvent::OrderCreated(data) => data.order_id,
            OrderEvent::OrderShipped(data) => data.order_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let order_id = AggregateId::new(1);
        assert_eq!(
            OrderEvent::order_created(order_id, "Book").event_type(),
            "OrderCreated"
        );
        assert_eq!(OrderEvent::order_shipped(order_id).event_type(), "OrderShipped");
    }

    #[test]
    fn test_order_created_serialization() {
        let event = OrderEvent::order_created(AggregateId::new(1), "Book");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "OrderCreated");
        assert_eq!(json["data"]["order_id"], 1);
        assert_eq!(json["data"]["item"], "Book");

        let deserialized: OrderEvent = serde_json::from_value(json).unwrap();
        if let OrderEvent::OrderCreated(data) = deserialized {
            assert_eq!(data.order_id, AggregateId::new(1));
            assert_eq!(data.item.as_str(), "Book");
        } else {
            panic!("Expected OrderCreated event");
        }
    }

    #[test]
    fn test_order_id_accessor() {
        assert_eq!(
            OrderEvent::order_shipped(AggregateId::new(4)).order_id(),
            AggregateId::new(4)
        );
    }
}
