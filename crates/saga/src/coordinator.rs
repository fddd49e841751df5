//! Saga coordinator: runs steps in order and compensates on failure.

use std::time::Instant;

use common::AggregateId;
use domain::Order;
use serde::Serialize;

use crate::aggregate::SagaInstance;
use crate::definition::SagaDefinition;
use crate::error::SagaError;
use crate::events::SagaEvent;
use crate::state::SagaState;
use crate::step::SagaStep;

/// Name recorded for sagas run through [`run_saga`] without a definition.
pub const ANONYMOUS_SAGA: &str = "Saga";

/// How a saga run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SagaStatus {
    /// Every step succeeded.
    Completed,
    /// A step failed and every step that had succeeded was compensated.
    Compensated,
}

impl From<SagaStatus> for SagaState {
    fn from(status: SagaStatus) -> Self {
        match status {
            SagaStatus::Completed => SagaState::Completed,
            SagaStatus::Compensated => SagaState::Compensated,
        }
    }
}

/// Outcome of a saga run.
///
/// `executed` lists every step whose forward action ran, the failed one
/// included. `compensated` lists compensations in the order they ran, which
/// is the reverse of the order their steps succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct SagaResult {
    pub saga: String,
    pub order_id: AggregateId,
    pub status: SagaStatus,
    pub executed: Vec<String>,
    pub compensated: Vec<String>,
    pub failure: Option<SagaError>,
    pub events: Vec<SagaEvent>,
}

impl SagaResult {
    /// Returns true if every step succeeded.
    pub fn is_completed(&self) -> bool {
        self.status == SagaStatus::Completed
    }

    /// Returns true if the saga failed and was compensated.
    pub fn is_compensated(&self) -> bool {
        self.status == SagaStatus::Compensated
    }
}

/// Runs saga definitions.
///
/// Steps run one at a time on the calling thread. The first failing step
/// stops forward execution; every step that had already succeeded is then
/// compensated, most recent first. A step failure is reported in the
/// [`SagaResult`], never as an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct SagaCoordinator;

impl SagaCoordinator {
    /// Runs a definition against an order.
    pub fn run(definition: &SagaDefinition, order: &Order) -> SagaResult {
        execute(definition.name(), definition.steps(), order)
    }
}

/// Runs an ordered list of steps against an order.
pub fn run_saga(order: &Order, steps: &[Box<dyn SagaStep>]) -> SagaResult {
    execute(ANONYMOUS_SAGA, steps, order)
}

#[tracing::instrument(skip(steps, order), fields(order_id = %order.id, steps = steps.len()))]
fn execute(saga_name: &str, steps: &[Box<dyn SagaStep>], order: &Order) -> SagaResult {
    metrics::counter!("saga_executions_total").increment(1);
    let saga_start = Instant::now();

    let mut saga = SagaInstance::default();
    record(&mut saga, SagaEvent::saga_started(saga_name, order.id));

    let mut failure = None;
    for step in steps {
        let name = step.name();
        tracing::info!(step = name, "saga step started");
        record(&mut saga, SagaEvent::step_started(name));

        match step.execute(order) {
            Ok(()) => {
                record(&mut saga, SagaEvent::step_completed(name));
                tracing::info!(step = name, "saga step completed");
            }
            Err(err) => {
                tracing::warn!(step = name, error = %err, "saga step failed");
                record(&mut saga, SagaEvent::step_failed(name, reason(&err)));
                failure = Some((name, err));
                break;
            }
        }
    }

    let status = match &failure {
        None => {
            record(&mut saga, SagaEvent::saga_completed());
            metrics::counter!("saga_completed").increment(1);
            SagaStatus::Completed
        }
        Some((failed_step, _)) => {
            compensate(&mut saga, steps, order, failed_step);
            metrics::counter!("saga_compensated").increment(1);
            SagaStatus::Compensated
        }
    };

    let duration = saga_start.elapsed().as_secs_f64();
    metrics::histogram!("saga_duration_seconds").record(duration);
    tracing::info!(saga = saga_name, status = ?status, duration, "saga finished");

    SagaResult {
        saga: saga_name.to_string(),
        order_id: order.id,
        status,
        executed: saga.executed_steps().to_vec(),
        compensated: saga.compensated_steps().to_vec(),
        failure: failure.map(|(_, err)| err),
        events: saga.into_history(),
    }
}

/// Compensates succeeded steps in reverse order of completion.
fn compensate(
    saga: &mut SagaInstance,
    steps: &[Box<dyn SagaStep>],
    order: &Order,
    failed_step: &str,
) {
    record(saga, SagaEvent::compensation_started(failed_step));

    // Only steps before the failed one succeeded.
    let succeeded = steps.get(..saga.completed_steps().len()).unwrap_or_default();
    for step in succeeded.iter().rev() {
        tracing::warn!(step = step.name(), "compensating saga step");
        step.compensate(order);
        record(saga, SagaEvent::step_compensated(step.name()));
        metrics::counter!("saga_steps_compensated_total").increment(1);
    }

    record(saga, SagaEvent::saga_compensated());
}

/// Records an event the coordinator itself sequenced.
fn record(saga: &mut SagaInstance, event: SagaEvent) {
    if let Err(err) = saga.record(event) {
        tracing::error!(error = %err, "saga state machine rejected coordinator event");
    }
}

fn reason(err: &SagaError) -> String {
    match err {
        SagaError::StepFailed { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}
