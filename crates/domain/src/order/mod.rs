//! Order value object, event-sourced lifecycle and the hexagonal order service.

mod events;
mod journal;
mod lifecycle;
mod repository;
mod service;
mod state;
mod value_objects;

pub use events::{OrderCreatedData, OrderEvent, OrderShippedData};
pub use journal::OrderJournal;
pub use lifecycle::OrderLifecycle;
pub use repository::{InMemoryOrderRepository, OrderRepository};
pub use service::OrderService;
pub use state::OrderState;
pub use value_objects::{Money, Order, ProductId};

use thiserror::Error;

/// Errors raised by order business rules.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order is not in the expected state.
    #[error("Invalid state transition: cannot {action} from {current_state} state")]
    InvalidStateTransition {
        current_state: OrderState,
        action: &'static str,
    },

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Invalid amount.
    #[error("Invalid amount: {amount} (must not be negative)")]
    InvalidAmount { amount: Money },

    /// Order is already created.
    #[error("Order already created")]
    AlreadyCreated,
}
