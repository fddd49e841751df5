//! Saga pattern with reverse-order compensation.
//!
//! A saga is a fixed, ordered list of steps run against an order. Each step
//! has a forward action and a compensation. When a forward action fails,
//! no further steps run and every step that already succeeded is
//! compensated, most recent first.
//!
//! The order fulfillment saga in [`order_fulfillment`] follows these steps:
//! 1. Process payment
//! 2. Create shipment

pub mod aggregate;
pub mod coordinator;
pub mod definition;
pub mod error;
pub mod events;
pub mod order_fulfillment;
pub mod services;
pub mod state;
pub mod step;

pub use aggregate::SagaInstance;
pub use coordinator::{SagaCoordinator, SagaResult, SagaStatus, run_saga};
pub use definition::{SagaDefinition, SagaDefinitionBuilder};
pub use error::SagaError;
pub use events::SagaEvent;
pub use order_fulfillment::{FulfillmentConfig, PaymentStep, ShippingStep};
pub use services::{
    InMemoryPaymentService, InMemoryShippingService, PaymentReceipt, PaymentService,
    ServiceError, ShipmentReceipt, ShippingService,
};
pub use state::SagaState;
pub use step::{FnStep, SagaStep};
