//! Orders-by-item read model: which orders asked for which item.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use domain::{OrderEvent, ProductId};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

struct OrdersByItemState {
    items: BTreeMap<ProductId, Vec<AggregateId>>,
    order_count: usize,
    position: ProjectionPosition,
}

impl OrdersByItemState {
    fn empty() -> Self {
        Self {
            items: BTreeMap::new(),
            order_count: 0,
            position: ProjectionPosition::zero(),
        }
    }
}

/// Index of order ids per item, in the order the orders were created.
///
/// Clones share the same state, so one handle can be registered with a
/// [`ProjectionProcessor`](crate::ProjectionProcessor) and another kept for
/// queries.
#[derive(Clone)]
pub struct OrdersByItemView {
    state: Arc<RwLock<OrdersByItemState>>,
}

impl OrdersByItemView {
    /// Creates an empty view.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(OrdersByItemState::empty())),
        }
    }

    /// Returns the orders created for an item, oldest first.
    pub async fn orders_for_item(&self, item: &ProductId) -> Vec<AggregateId> {
        self.state
            .read()
            .await
            .items
            .get(item)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns every item that has at least one order, sorted.
    pub async fn items(&self) -> Vec<ProductId> {
        self.state.read().await.items.keys().cloned().collect()
    }

    /// Returns a copy of the whole index.
    pub async fn snapshot(&self) -> BTreeMap<ProductId, Vec<AggregateId>> {
        self.state.read().await.items.clone()
    }
}

impl Default for OrdersByItemView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for OrdersByItemView {
    fn name(&self) -> &'static str {
        "OrdersByItemView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "Order" {
            let mut state = self.state.write().await;
            state.position = state.position.advance();
            return Ok(());
        }

        let order_event: OrderEvent = serde_json::from_value(event.payload.clone())?;

        let mut state = self.state.write().await;
        if let OrderEvent::OrderCreated(data) = order_event {
            state.items.entry(data.item).or_default().push(data.order_id);
            state.order_count += 1;
        }
        state.position = state.position.advance();

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = OrdersByItemState::empty();
        Ok(())
    }
}

impl ReadModel for OrdersByItemView {
    fn name(&self) -> &'static str {
        "orders_by_item"
    }

    fn count(&self) -> usize {
        self.state
            .try_read()
            .map(|state| state.order_count)
            .unwrap_or(0)
    }
}
