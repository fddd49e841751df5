//! Payment and shipping services used by the order fulfillment steps.

pub mod payment;
pub mod shipping;

use common::AggregateId;
use thiserror::Error;

pub use payment::{InMemoryPaymentService, PaymentReceipt, PaymentService};
pub use shipping::{InMemoryShippingService, ShipmentReceipt, ShippingService};

/// Errors raised by the external services a saga step calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The payment provider refused the charge.
    #[error("Payment declined")]
    PaymentDeclined,

    /// The carrier could not create a shipment.
    #[error("Shipping unavailable")]
    ShippingUnavailable,

    /// The order already holds a payment that has not been refunded.
    #[error("Order {0} already charged")]
    AlreadyCharged(AggregateId),

    /// The order already holds a shipment that has not been cancelled.
    #[error("Order {0} already shipped")]
    AlreadyShipped(AggregateId),
}
