//! SessionState enum for the lifecycle of one guided interaction.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Lifecycle state of a session.
///
/// `Active` is the only non-terminal state. `Active -> Active` is the
/// advance transition (the current node moves, the state does not).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Active,
    Escalated,
    Completed,
    Aborted,
}

impl SessionState {
    /// Returns true while the session still accepts transitions.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active)
    }
}

impl StateMachine for SessionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionState::*;
        matches!(
            (self, target),
            (Active, Active) | (Active, Escalated) | (Active, Completed) | (Active, Aborted)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionState::*;
        match self {
            Active => vec![Active, Escalated, Completed, Aborted],
            Escalated | Completed | Aborted => vec![],
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Active => "Active",
            SessionState::Escalated => "Escalated",
            SessionState::Completed => "Completed",
            SessionState::Aborted => "Aborted",
        };
        write!(f, "{}", s)
    }
}
