//! Saga instance aggregate.

use common::AggregateId;
use domain::{Aggregate, DomainEvent};
use event_store::Version;

use crate::error::SagaError;
use crate::events::SagaEvent;
use crate::state::SagaState;

/// One run of a saga, rebuilt from its events.
///
/// [`Aggregate::apply`] folds an event in unconditionally, as replay
/// requires. [`SagaInstance::record`] is the checked entry point used while
/// a saga runs: it rejects any event the current state does not allow,
/// including compensations out of reverse order.
#[derive(Debug, Clone, Default)]
pub struct SagaInstance {
    id: Option<AggregateId>,
    version: Version,
    saga_name: String,
    state: SagaState,
    current_step: Option<String>,
    executed_steps: Vec<String>,
    completed_steps: Vec<String>,
    compensated_steps: Vec<String>,
    failed_step: Option<String>,
    failure_reason: Option<String>,
    history: Vec<SagaEvent>,
}

impl Aggregate for SagaInstance {
    type Event = SagaEvent;
    type Error = SagaError;

    fn aggregate_type() -> &'static str {
        "Saga"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            SagaEvent::SagaStarted(data) => {
                self.id = Some(data.order_id);
                self.saga_name = data.saga_name;
                self.state = SagaState::Running;
            }
            SagaEvent::StepStarted(data) => {
                self.executed_steps.push(data.step_name.clone());
                self.current_step = Some(data.step_name);
            }
            SagaEvent::StepCompleted(data) => {
                self.current_step = None;
                self.completed_steps.push(data.step_name);
            }
            SagaEvent::StepFailed(data) => {
                self.current_step = None;
                self.failed_step = Some(data.step_name);
                self.failure_reason = Some(data.reason);
            }
            SagaEvent::CompensationStarted(_) => {
                self.state = SagaState::Compensating;
            }
            SagaEvent::StepCompensated(data) => {
                self.compensated_steps.push(data.step_name);
            }
            SagaEvent::SagaCompleted(_) => {
                self.state = SagaState::Completed;
            }
            SagaEvent::SagaCompensated(_) => {
                self.state = SagaState::Compensated;
            }
        }
    }
}

impl SagaInstance {
    /// Validates an event against the current state, then applies it and
    /// keeps it in the history.
    pub fn record(&mut self, event: SagaEvent) -> Result<(), SagaError> {
        self.check(&event)?;
        self.history.push(event.clone());
        self.apply(event);
        self.version = self.version.next();
        Ok(())
    }

    fn check(&self, event: &SagaEvent) -> Result<(), SagaError> {
        let (allowed, action) = match event {
            SagaEvent::SagaStarted(_) => (self.state.can_run(), "start"),
            SagaEvent::StepStarted(_) => (
                self.state.can_execute_steps()
                    && self.current_step.is_none()
                    && self.failed_step.is_none(),
                "start a step",
            ),
            SagaEvent::StepCompleted(data) => (
                self.state.can_execute_steps() && self.is_current(&data.step_name),
                "complete a step that is not running",
            ),
            SagaEvent::StepFailed(data) => (
                self.state.can_execute_steps() && self.is_current(&data.step_name),
                "fail a step that is not running",
            ),
            SagaEvent::CompensationStarted(_) => (
                self.state.can_compensate() && self.failed_step.is_some(),
                "compensate without a failed step",
            ),
            SagaEvent::StepCompensated(data) => (
                self.state == SagaState::Compensating
                    && self.next_compensation() == Some(data.step_name.as_str()),
                "compensate out of reverse order",
            ),
            SagaEvent::SagaCompleted(_) => (
                self.state.can_execute_steps()
                    && self.current_step.is_none()
                    && self.failed_step.is_none(),
                "complete",
            ),
            SagaEvent::SagaCompensated(_) => (
                self.state == SagaState::Compensating && self.next_compensation().is_none(),
                "finish compensation with steps left",
            ),
        };

        if allowed {
            Ok(())
        } else {
            tracing::debug!(event_type = event.event_type(), state = %self.state, "rejected saga event");
            Err(SagaError::InvalidState {
                action,
                actual: self.state,
            })
        }
    }

    fn is_current(&self, step_name: &str) -> bool {
        self.current_step.as_deref() == Some(step_name)
    }

    /// Returns the next step to compensate: the most recently completed step
    /// that has not been compensated yet.
    pub fn next_compensation(&self) -> Option<&str> {
        self.pending_compensations().into_iter().next()
    }

    /// Returns the completed steps still awaiting compensation, most recent
    /// first.
    pub fn pending_compensations(&self) -> Vec<&str> {
        let remaining = self
            .completed_steps
            .len()
            .saturating_sub(self.compensated_steps.len());
        self.completed_steps[..remaining]
            .iter()
            .rev()
            .map(String::as_str)
            .collect()
    }

    /// Returns the saga state.
    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Returns the name of the saga definition being run.
    pub fn saga_name(&self) -> &str {
        &self.saga_name
    }

    /// Returns the steps whose forward action ran, including a failed one.
    pub fn executed_steps(&self) -> &[String] {
        &self.executed_steps
    }

    /// Returns the steps whose forward action succeeded.
    pub fn completed_steps(&self) -> &[String] {
        &self.completed_steps
    }

    /// Returns the steps compensated so far, in compensation order.
    pub fn compensated_steps(&self) -> &[String] {
        &self.compensated_steps
    }

    /// Returns the step that failed, if any.
    pub fn failed_step(&self) -> Option<&str> {
        self.failed_step.as_deref()
    }

    /// Returns the failure reason, if any.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns every recorded event, oldest first.
    pub fn history(&self) -> &[SagaEvent] {
        &self.history
    }

    /// Consumes the instance, returning its recorded events.
    pub fn into_history(self) -> Vec<SagaEvent> {
        self.history
    }
}
