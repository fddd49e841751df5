//! Order fulfillment saga: charge the payment, then ship the order.

use domain::{Money, Order};

use crate::definition::SagaDefinition;
use crate::error::{Result, SagaError};
use crate::services::{PaymentService, ShippingService};
use crate::step::SagaStep;

/// The saga name for order fulfillment.
pub const SAGA_NAME: &str = "OrderFulfillment";

/// Step name: charge the order amount.
pub const STEP_PROCESS_PAYMENT: &str = "process_payment";

/// Step name: create a shipment for the order.
pub const STEP_CREATE_SHIPMENT: &str = "create_shipment";

/// Failure reason when the amount is above the payment threshold.
pub const PAYMENT_FAILED: &str = "Payment failed";

/// Settings for the order fulfillment saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FulfillmentConfig {
    /// Orders above this amount are refused by the payment step.
    pub payment_threshold: Money,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            payment_threshold: Money::from_dollars(1000),
        }
    }
}

/// Charges the order amount. Refunds it on compensation.
#[derive(Debug, Clone)]
pub struct PaymentStep<P> {
    payment: P,
    threshold: Money,
}

impl<P: PaymentService> PaymentStep<P> {
    pub fn new(payment: P, threshold: Money) -> Self {
        Self { payment, threshold }
    }
}

impl<P: PaymentService> SagaStep for PaymentStep<P> {
    fn name(&self) -> &str {
        STEP_PROCESS_PAYMENT
    }

    fn execute(&self, order: &Order) -> Result<()> {
        tracing::info!(order_id = %order.id, amount = %order.amount, "processing payment");
        if order.amount > self.threshold {
            return Err(SagaError::step_failed(STEP_PROCESS_PAYMENT, PAYMENT_FAILED));
        }

        self.payment
            .charge(order.id, order.amount)
            .map(|_| ())
            .map_err(|e| SagaError::step_failed(STEP_PROCESS_PAYMENT, e.to_string()))
    }

    fn compensate(&self, order: &Order) {
        if self.payment.refund(order.id).is_none() {
            tracing::warn!(order_id = %order.id, "no payment to refund");
        }
    }
}

/// Creates a shipment. Cancels it on compensation.
#[derive(Debug, Clone)]
pub struct ShippingStep<S> {
    shipping: S,
}

impl<S: ShippingService> ShippingStep<S> {
    pub fn new(shipping: S) -> Self {
        Self { shipping }
    }
}

impl<S: ShippingService> SagaStep for ShippingStep<S> {
    fn name(&self) -> &str {
        STEP_CREATE_SHIPMENT
    }

    fn execute(&self, order: &Order) -> Result<()> {
        tracing::info!(order_id = %order.id, "shipping order");
        self.shipping
            .create_shipment(order.id)
            .map(|_| ())
            .map_err(|e| SagaError::step_failed(STEP_CREATE_SHIPMENT, e.to_string()))
    }

    fn compensate(&self, order: &Order) {
        if self.shipping.cancel_shipment(order.id).is_none() {
            tracing::warn!(order_id = %order.id, "no shipment to cancel");
        }
    }
}

/// Builds the two-step fulfillment saga: payment, then shipping.
pub fn definition<P, S>(config: FulfillmentConfig, payment: P, shipping: S) -> SagaDefinition
where
    P: PaymentService + 'static,
    S: ShippingService + 'static,
{
    SagaDefinition::builder(SAGA_NAME)
        .step(PaymentStep::new(payment, config.payment_threshold))
        .step(ShippingStep::new(shipping))
        .build()
}

#[cfg(test)]
mod tests {
    use common::AggregateId;

    use super::*;
    use crate::services::{InMemoryPaymentService, InMemoryShippingService};

    #[test]
    fn default_threshold_is_one_thousand() {
        assert_eq!(
            FulfillmentConfig::default().payment_threshold,
            Money::from_cents(100_000)
        );
    }

    #[test]
    fn payment_at_threshold_is_charged() {
        let payment = InMemoryPaymentService::new();
        let step = PaymentStep::new(payment.clone(), Money::from_dollars(1000));

        step.execute(&Order::new(1, Money::from_dollars(1000)))
            .unwrap();
        assert!(payment.payment_for(AggregateId::new(1)).is_some());
    }

    #[test]
    fn payment_above_threshold_fails_without_charging() {
        let payment = InMemoryPaymentService::new();
        let step = PaymentStep::new(payment.clone(), Money::from_dollars(1000));

        let result = step.execute(&Order::new(1, Money::from_cents(100_001)));
        assert_eq!(
            result,
            Err(SagaError::step_failed("process_payment", "Payment failed"))
        );
        assert_eq!(payment.payment_count(), 0);
    }

    #[test]
    fn declined_payment_reports_service_error() {
        let payment = InMemoryPaymentService::new();
        payment.set_fail_on_charge(true);
        let step = PaymentStep::new(payment, Money::from_dollars(1000));

        let result = step.execute(&Order::new(1, Money::from_dollars(5)));
        assert_eq!(
            result,
            Err(SagaError::step_failed("process_payment", "Payment declined"))
        );
    }

    #[test]
    fn payment_compensation_refunds() {
        let payment = InMemoryPaymentService::new();
        let step = PaymentStep::new(payment.clone(), Money::from_dollars(1000));
        let order = Order::new(1, Money::from_dollars(10));

        step.execute(&order).unwrap();
        step.compensate(&order);

        assert_eq!(payment.payment_count(), 0);
        assert_eq!(payment.refunds().len(), 1);
    }

    #[test]
    fn shipping_compensation_cancels() {
        let shipping = InMemoryShippingService::new();
        let step = ShippingStep::new(shipping.clone());
        let order = Order::new(1, Money::from_dollars(10));

        step.execute(&order).unwrap();
        step.compensate(&order);

        assert_eq!(shipping.shipment_count(), 0);
        assert_eq!(shipping.cancelled().len(), 1);
    }

    #[test]
    fn definition_orders_payment_before_shipping() {
        let definition = definition(
            FulfillmentConfig::default(),
            InMemoryPaymentService::new(),
            InMemoryShippingService::new(),
        );
        assert_eq!(definition.name(), SAGA_NAME);
        assert_eq!(
            definition.step_names(),
            vec![STEP_PROCESS_PAYMENT, STEP_CREATE_SHIPMENT]
        );
    }
}
