//! Domain layer for the order-patterns workspace.
//!
//! This crate provides:
//! - Aggregate and DomainEvent traits, and a CommandHandler over an event store
//! - The `Order` value object and `Money`
//! - `OrderService`, a core service behind the `OrderRepository` port
//! - `OrderJournal`, an event-sourced order lifecycle
//! - Billing and inventory modules wired together by `monolith::place_order`

pub mod aggregate;
pub mod command;
pub mod error;
pub mod monolith;
pub mod order;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{CommandHandler, CommandResult};
pub use error::DomainError;
pub use order::{
    InMemoryOrderRepository, Money, Order, OrderCreatedData, OrderError, OrderEvent, OrderJournal,
    OrderLifecycle, OrderRepository, OrderService, OrderShippedData, OrderState, ProductId,
};
