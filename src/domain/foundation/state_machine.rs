//! State machine trait for status enums.
//!
//! Gives lifecycle enums (circuit state, health status) a single way to
//! declare their legal transitions and to reject anything else.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for CircuitState {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!((self, target), (Closed, Open) | (Open, HalfOpen) | ...)
///     }
///     ...
/// }
///
/// let next = CircuitState::Open.transition_to(CircuitState::HalfOpen)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Probe {
        Idle,
        Running,
        Finished,
    }

    impl StateMachine for Probe {
        fn can_transition_to(&self, target: &Self) -> bool {
            self.valid_transitions().contains(target)
        }

        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Probe::Idle => vec![Probe::Running],
                Probe::Running => vec![Probe::Idle, Probe::Finished],
                Probe::Finished => vec![],
            }
        }
    }

    #[test]
    fn legal_transition_returns_target() {
        assert_eq!(Probe::Idle.transition_to(Probe::Running), Ok(Probe::Running));
    }

    #[test]
    fn illegal_transition_is_rejected_with_both_states_named() {
        let err = Probe::Idle.transition_to(Probe::Finished).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Idle"));
        assert!(message.contains("Finished"));
    }

    #[test]
    fn finished_probe_is_terminal() {
        assert!(Probe::Finished.is_terminal());
        assert!(!Probe::Running.is_terminal());
    }
}
