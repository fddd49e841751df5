//! Event-sourced order journal.

use common::AggregateId;
use event_store::EventStore;

use crate::aggregate::Aggregate;
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{OrderEvent, OrderLifecycle, ProductId};

/// Records order lifecycle events in a caller-supplied event store and
/// rebuilds orders by replaying them.
pub struct OrderJournal<S: EventStore> {
    handler: CommandHandler<S, OrderLifecycle>,
}

impl<S: EventStore> OrderJournal<S> {
    /// Creates a journal over the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns the underlying event store.
    pub fn store(&self) -> &S {
        self.handler.store()
    }

    /// Appends an `OrderCreated` event.
    #[tracing::instrument(skip(self, item), fields(item = %item))]
    pub async fn create_order(
        &self,
        order_id: AggregateId,
        item: ProductId,
    ) -> Result<CommandResult<OrderLifecycle>, DomainError> {
        let result = self
            .handler
            .execute(order_id, |order| order.create(order_id, item))
            .await?;
        tracing::info!(%order_id, "order created");
        Ok(result)
    }

    /// Appends an `OrderShipped` event.
    #[tracing::instrument(skip(self))]
    pub async fn ship_order(
        &self,
        order_id: AggregateId,
    ) -> Result<CommandResult<OrderLifecycle>, DomainError> {
        self.require_existing(order_id).await?;
        let result = self.handler.execute(order_id, |order| order.ship()).await?;
        tracing::info!(%order_id, "order shipped");
        Ok(result)
    }

    /// Rebuilds an order from its events.
    ///
    /// Returns None if the order has no events.
    pub async fn get_order(
        &self,
        order_id: AggregateId,
    ) -> Result<Option<OrderLifecycle>, DomainError> {
        self.handler.load_existing(order_id).await
    }

    /// Returns the order's events in the order they were recorded.
    pub async fn history(&self, order_id: AggregateId) -> Result<Vec<OrderEvent>, DomainError> {
        self.store()
            .get_events_for_aggregate(order_id)
            .await?
            .iter()
            .map(|envelope| envelope.decode().map_err(DomainError::from))
            .collect()
    }

    async fn require_existing(&self, order_id: AggregateId) -> Result<(), DomainError> {
        match self.get_order(order_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::AggregateNotFound {
                aggregate_type: OrderLifecycle::aggregate_type(),
                aggregate_id: order_id.to_string(),
            }),
        }
    }
}
