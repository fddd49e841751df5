//! Saga error types.

use serde::Serialize;
use thiserror::Error;

use crate::state::SagaState;

/// Errors that can occur during saga operations.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind")]
pub enum SagaError {
    /// A forward action failed. Triggers compensation.
    #[error("Saga step '{step}' failed: {reason}")]
    StepFailed { step: String, reason: String },

    /// An event was recorded that the saga's current state does not allow.
    #[error("Invalid saga state: cannot {action} while {actual}")]
    InvalidState {
        action: &'static str,
        actual: SagaState,
    },
}

impl SagaError {
    /// Creates a `StepFailed` error.
    pub fn step_failed(step: impl Into<String>, reason: impl Into<String>) -> Self {
        SagaError::StepFailed {
            step: step.into(),
            reason: reason.into(),
        }
    }

    /// Returns the failed step's name, if this is a step failure.
    pub fn step(&self) -> Option<&str> {
        match self {
            SagaError::StepFailed { step, .. } => Some(step),
            SagaError::InvalidState { .. } => None,
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
