//! Saga state machine.

use serde::{Deserialize, Serialize};

/// The state of a saga in its lifecycle.
///
/// State transitions:
/// ```text
/// NotStarted ──► Running ──┬──► Completed
///                          └──► Compensating ──► Compensated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// Saga has not started yet.
    #[default]
    NotStarted,

    /// Forward steps are being executed.
    Running,

    /// A step failed and compensations are in progress.
    Compensating,

    /// All steps completed successfully (terminal state).
    Completed,

    /// Every succeeded step was compensated after a failure (terminal state).
    Compensated,
}

impl SagaState {
    /// Returns true if the saga can begin running.
    pub fn can_run(&self) -> bool {
        matches!(self, SagaState::NotStarted)
    }

    /// Returns true if forward steps may be executed.
    pub fn can_execute_steps(&self) -> bool {
        matches!(self, SagaState::Running)
    }

    /// Returns true if the saga can begin compensation.
    pub fn can_compensate(&self) -> bool {
        matches!(self, SagaState::Running)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Completed | SagaState::Compensated)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::NotStarted => "NotStarted",
            SagaState::Running => "Running",
            SagaState::Compensating => "Compensating",
            SagaState::Completed => "Completed",
            SagaState::Compensated => "Compensated",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SagaState; 5] = [
        SagaState::NotStarted,
        SagaState::Running,
        SagaState::Compensating,
        SagaState::Completed,
        SagaState::Compensated,
    ];

    #[test]
    fn default_state_is_not_started() {
        assert_eq!(SagaState::default(), SagaState::NotStarted);
    }

    #[test]
    fn only_not_started_can_run() {
        let runnable: Vec<_> = ALL.into_iter().filter(SagaState::can_run).collect();
        assert_eq!(runnable, vec![SagaState::NotStarted]);
    }

    #[test]
    fn only_running_can_compensate() {
        let compensable: Vec<_> = ALL.into_iter().filter(SagaState::can_compensate).collect();
        assert_eq!(compensable, vec![SagaState::Running]);
    }

    #[test]
    fn terminal_states() {
        let terminal: Vec<_> = ALL.into_iter().filter(SagaState::is_terminal).collect();
        assert_eq!(terminal, vec![SagaState::Completed, SagaState::Compensated]);
    }

    #[test]
    fn display() {
        assert_eq!(SagaState::Compensating.to_string(), "Compensating");
        assert_eq!(SagaState::Compensated.to_string(), "Compensated");
    }

    #[test]
    fn serializes_as_name() {
        let json = serde_json::to_string(&SagaState::Compensated).unwrap();
        assert_eq!(json, "\"Compensated\"");
        let back: SagaState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SagaState::Compensated);
    }
}
