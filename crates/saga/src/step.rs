//! The unit of work a saga is made of.

use domain::Order;

use crate::error::Result;

/// A named saga step: a forward action and its compensation.
///
/// `execute` reports failure with [`SagaError::StepFailed`](crate::SagaError).
/// `compensate` semantically undoes a successful `execute` and cannot fail;
/// the default does nothing.
pub trait SagaStep: Send + Sync {
    /// Returns the step name used in traces and results.
    fn name(&self) -> &str;

    /// Runs the forward action.
    fn execute(&self, order: &Order) -> Result<()>;

    /// Reverses a successful forward action.
    fn compensate(&self, _order: &Order) {}
}

type Action = Box<dyn Fn(&Order) -> Result<()> + Send + Sync>;
type Compensation = Box<dyn Fn(&Order) + Send + Sync>;

/// A step built from closures.
///
/// ```
/// use saga::{FnStep, SagaStep};
///
/// let step = FnStep::new("notify", |_order| Ok(()))
///     .with_compensation(|_order| {});
/// assert_eq!(step.name(), "notify");
/// ```
pub struct FnStep {
    name: String,
    action: Action,
    compensation: Option<Compensation>,
}

impl FnStep {
    /// Creates a step with the given forward action and no compensation.
    pub fn new(
        name: impl Into<String>,
        action: impl Fn(&Order) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            action: Box::new(action),
            compensation: None,
        }
    }

    /// Sets the compensation action.
    pub fn with_compensation(mut self, compensation: impl Fn(&Order) + Send + Sync + 'static) -> Self {
        self.compensation = Some(Box::new(compensation));
        self
    }
}

impl std::fmt::Debug for FnStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStep")
            .field("name", &self.name)
            .field("has_compensation", &self.compensation.is_some())
            .finish()
    }
}

impl SagaStep for FnStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, order: &Order) -> Result<()> {
        (self.action)(order)
    }

    fn compensate(&self, order: &Order) {
        if let Some(compensation) = &self.compensation {
            compensation(order);
        }
    }
}
