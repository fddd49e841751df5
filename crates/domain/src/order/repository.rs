//! Order repository port and its in-memory adapter.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use tokio::sync::RwLock;

use crate::error::DomainError;

use super::{Order, OrderError};

/// Storage port used by [`OrderService`](super::OrderService).
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores an order, replacing any order with the same id.
    async fn save(&self, order: Order) -> Result<Order, DomainError>;

    /// Stores an order only if its id is free.
    ///
    /// The check and the write are one step: of two inserts racing on the
    /// same id, exactly one fails with [`OrderError::AlreadyCreated`].
    async fn insert(&self, order: Order) -> Result<Order, DomainError>;

    /// Looks an order up by id.
    async fn get(&self, order_id: AggregateId) -> Result<Option<Order>, DomainError>;

    /// Returns every stored order, ordered by id.
    async fn list(&self) -> Result<Vec<Order>, DomainError>;
}

/// Repository adapter keeping orders in memory.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<BTreeMap<AggregateId, Order>>>,
}

impl InMemoryOrderRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Returns true if no orders are stored.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: Order) -> Result<Order, DomainError> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(order)
    }

    async fn insert(&self, order: Order) -> Result<Order, DomainError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(OrderError::AlreadyCreated.into());
        }
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, order_id: AggregateId) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.orders.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Money;

    #[tokio::test]
    async fn save_and_get() {
        let repo = InMemoryOrderRepository::new();
        let order = Order::new(1, Money::from_dollars(10)).with_quantity(3);

        let saved = repo.save(order.clone()).await.unwrap();
        assert_eq!(saved, order);
        assert_eq!(repo.get(AggregateId::new(1)).await.unwrap(), Some(order));
        assert_eq!(repo.get(AggregateId::new(2)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn insert_refuses_a_taken_id() {
        let repo = InMemoryOrderRepository::new();
        repo.insert(Order::new(1, Money::zero()).with_quantity(1))
            .await
            .unwrap();

        let result = repo
            .insert(Order::new(1, Money::zero()).with_quantity(99))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::AlreadyCreated))
        ));
        let stored = repo.get(AggregateId::new(1)).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 1);
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let repo = InMemoryOrderRepository::new();
        repo.save(Order::new(2, Money::zero())).await.unwrap();
        repo.save(Order::new(1, Money::zero())).await.unwrap();

        let ids: Vec<u64> = repo
            .list()
            .await
            .unwrap()
            .iter()
            .map(|o| o.id.as_u64())
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let repo = InMemoryOrderRepository::new();
        let other = repo.clone();
        repo.save(Order::new(1, Money::zero())).await.unwrap();
        assert!(!other.is_empty().await);
    }
}
