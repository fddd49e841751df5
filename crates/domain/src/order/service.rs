//! Order service: business rules in front of an [`OrderRepository`].

use common::AggregateId;

use crate::error::DomainError;

use super::{Order, OrderError, OrderRepository};

/// Validates and stores orders through a repository port.
///
/// The service knows nothing about where orders live; any
/// [`OrderRepository`] adapter can be plugged in.
pub struct OrderService<R: OrderRepository> {
    repository: R,
}

impl<R: OrderRepository> OrderService<R> {
    /// Creates a service over the given repository.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Creates an order.
    ///
    /// Rejects a zero quantity, a negative amount, and an id that is
    /// already taken.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn create_order(&self, order: Order) -> Result<Order, DomainError> {
        if order.quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                quantity: order.quantity,
            }
            .into());
        }

        if order.amount.is_negative() {
            return Err(OrderError::InvalidAmount {
                amount: order.amount,
            }
            .into());
        }

        let saved = self.repository.insert(order).await?;
        metrics::counter!("orders_created_total").increment(1);
        Ok(saved)
    }

    /// Loads an order by ID.
    pub async fn get_order(&self, order_id: AggregateId) -> Result<Option<Order>, DomainError> {
        self.repository.get(order_id).await
    }

    /// Lists all orders.
    pub async fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        self.repository.list().await
    }
}
