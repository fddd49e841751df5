//! Saga definitions: a named, fixed sequence of steps.

use crate::step::SagaStep;

/// An ordered list of steps, fixed once built.
///
/// Definitions hold no per-run state, so one definition can run any number
/// of times against different orders.
pub struct SagaDefinition {
    name: String,
    steps: Vec<Box<dyn SagaStep>>,
}

impl SagaDefinition {
    /// Starts building a definition with the given name.
    pub fn builder(name: impl Into<String>) -> SagaDefinitionBuilder {
        SagaDefinitionBuilder {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Returns the saga name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the steps in execution order.
    pub fn steps(&self) -> &[Box<dyn SagaStep>] {
        &self.steps
    }

    /// Returns the step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the definition has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for SagaDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SagaDefinition")
            .field("name", &self.name)
            .field("steps", &self.step_names())
            .finish()
    }
}

/// Builder for [`SagaDefinition`].
pub struct SagaDefinitionBuilder {
    name: String,
    steps: Vec<Box<dyn SagaStep>>,
}

impl SagaDefinitionBuilder {
    /// Appends a step.
    pub fn step(mut self, step: impl SagaStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Appends an already boxed step.
    pub fn boxed_step(mut self, step: Box<dyn SagaStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Finishes the definition.
    pub fn build(self) -> SagaDefinition {
        SagaDefinition {
            name: self.name,
            steps: self.steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnStep;

    #[test]
    fn keeps_step_order() {
        let definition = SagaDefinition::builder("Demo")
            .step(FnStep::new("first", |_| Ok(())))
            .boxed_step(Box::new(FnStep::new("second", |_| Ok(()))))
            .step(FnStep::new("third", |_| Ok(())))
            .build();

        assert_eq!(definition.name(), "Demo");
        assert_eq!(definition.step_names(), vec!["first", "second", "third"]);
        assert_eq!(definition.len(), 3);
    }

    #[test]
    fn empty_definition() {
        let definition = SagaDefinition::builder("Empty").build();
        assert!(definition.is_empty());
        assert!(format!("{definition:?}").contains("Empty"));
    }
}
