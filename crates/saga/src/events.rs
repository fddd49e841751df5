//! Saga domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::DomainEvent;
use serde::{Deserialize, Serialize};

/// Events recorded while a saga runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SagaEvent {
    /// Saga execution started.
    SagaStarted(SagaStartedData),

    /// A forward action is about to run.
    StepStarted(StepData),

    /// A forward action succeeded.
    StepCompleted(StepData),

    /// A forward action failed.
    StepFailed(StepFailedData),

    /// Compensation started after a step failure.
    CompensationStarted(CompensationData),

    /// A succeeded step was compensated.
    StepCompensated(StepData),

    /// Every step succeeded.
    SagaCompleted(SagaFinishedData),

    /// Every succeeded step was compensated after a failure.
    SagaCompensated(SagaFinishedData),
}

impl DomainEvent for SagaEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SagaEvent::SagaStarted(_) => "SagaStarted",
            SagaEvent::StepStarted(_) => "StepStarted",
            SagaEvent::StepCompleted(_) => "StepCompleted",
            SagaEvent::StepFailed(_) => "StepFailed",
            SagaEvent::CompensationStarted(_) => "CompensationStarted",
            SagaEvent::StepCompensated(_) => "StepCompensated",
            SagaEvent::SagaCompleted(_) => "SagaCompleted",
            SagaEvent::SagaCompensated(_) => "SagaCompensated",
        }
    }
}

/// Data for SagaStarted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaStartedData {
    /// The saga definition's name (e.g., "OrderFulfillment").
    pub saga_name: String,
    /// The order the saga runs against.
    pub order_id: AggregateId,
    /// When the saga started.
    pub started_at: DateTime<Utc>,
}

/// Data for events that only name a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepData {
    /// The step name.
    pub step_name: String,
}

/// Data for StepFailed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailedData {
    /// The step that failed.
    pub step_name: String,
    /// Error message describing the failure.
    pub reason: String,
}

/// Data for CompensationStarted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationData {
    /// The step that triggered compensation.
    pub from_step: String,
}

/// Data for SagaCompleted and SagaCompensated events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaFinishedData {
    /// When the saga reached its terminal state.
    pub finished_at: DateTime<Utc>,
}

// Convenience constructors
impl SagaEvent {
    /// Creates a SagaStarted event.
    pub fn saga_started(saga_name: impl Into<String>, order_id: AggregateId) -> Self {
        SagaEvent::SagaStarted(SagaStartedData {
            saga_name: saga_name.into(),
            order_id,
            started_at: Utc::now(),
        })
    }

    /// Creates a StepStarted event.
    pub fn step_started(step_name: impl Into<String>) -> Self {
        SagaEvent::StepStarted(StepData {
            step_name: step_name.into(),
        })
    }

    /// Creates a StepCompleted event.
    pub fn step_completed(step_name: impl Into<String>) -> Self {
        SagaEvent::StepCompleted(StepData {
            step_name: step_name.into(),
        })
    }

    /// Creates a StepFailed event.
    pub fn step_failed(step_name: impl Into<String>, reason: impl Into<String>) -> Self {
        SagaEvent::StepFailed(StepFailedData {
            step_name: step_name.into(),
            reason: reason.into(),
        })
    }

    /// Creates a CompensationStarted event.
    pub fn compensation_started(from_step: impl Into<String>) -> Self {
        SagaEvent::CompensationStarted(CompensationData {
            from_step: from_step.into(),
        })
    }

    /// Creates a StepCompensated event.
    pub fn step_compensated(step_name: impl Into<String>) -> Self {
        SagaEvent::StepCompensated(StepData {
            step_name: step_name.into(),
        })
    }

    /// Creates a SagaCompleted event.
    pub fn saga_completed() -> Self {
        SagaEvent::SagaCompleted(SagaFinishedData {
            finished_at: Utc::now(),
        })
    }

    /// Creates a SagaCompensated event.
    pub fn saga_compensated() -> Self {
        SagaEvent::SagaCompensated(SagaFinishedData {
            finished_at: Utc::now(),
        })
    }

    /// Returns the step this event refers to, if any.
    pub fn step_name(&self) -> Option<&str> {
        match self {
            SagaEvent::StepStarted(data)
            | SagaEvent::StepCompleted(data)
            | SagaEvent::StepCompensated(data) => Some(&data.step_name),
            SagaEvent::StepFailed(data) => Some(&data.step_name),
            SagaEvent::CompensationStarted(data) => Some(&data.from_step),
            SagaEvent::SagaStarted(_)
            | SagaEvent::SagaCompleted(_)
            | SagaEvent::SagaCompensated(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_types() {
        assert_eq!(
            SagaEvent::saga_started("OrderFulfillment", AggregateId::new(1)).event_type(),
            "SagaStarted"
        );
        assert_eq!(SagaEvent::step_started("a").event_type(), "StepStarted");
        assert_eq!(SagaEvent::step_completed("a").event_type(), "StepCompleted");
        assert_eq!(SagaEvent::step_failed("a", "x").event_type(), "StepFailed");
        assert_eq!(
            SagaEvent::compensation_started("a").event_type(),
            "CompensationStarted"
        );
        assert_eq!(
            SagaEvent::step_compensated("a").event_type(),
            "StepCompensated"
        );
        assert_eq!(SagaEvent::saga_completed().event_type(), "SagaCompleted");
        assert_eq!(SagaEvent::saga_compensated().event_type(), "SagaCompensated");
    }

    #[test]
    fn step_name_accessor() {
        assert_eq!(
            SagaEvent::step_failed("process_payment", "Payment failed").step_name(),
            Some("process_payment")
        );
        assert_eq!(SagaEvent::saga_completed().step_name(), None);
    }

    #[test]
    fn serialization_roundtrip() {
        let event = SagaEvent::step_failed("process_payment", "Payment failed");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "StepFailed");
        assert_eq!(json["data"]["reason"], "Payment failed");

        let back: SagaEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
