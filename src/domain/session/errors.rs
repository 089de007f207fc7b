//! Session-specific error types.

use thiserror::Error;

use super::TransitionKind;
use crate::domain::foundation::{ErrorCode, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A transition was attempted on a terminal session.
    #[error("Session is {state}; {attempted} is not allowed")]
    InvariantViolation {
        state: SessionState,
        attempted: TransitionKind,
    },

    /// A prepared transition no longer matches the session it came from.
    #[error("Prepared transition #{prepared} is stale; session is at #{current}")]
    StalePreparation { prepared: u64, current: u64 },

    #[error("Outcome can only be recorded for a completed session (session is {0})")]
    NotCompleted(SessionState),

    #[error("Outcome was already recorded for this session")]
    OutcomeAlreadyRecorded,
}

impl SessionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::InvariantViolation { .. } | SessionError::NotCompleted(_) => {
                ErrorCode::InvalidStateTransition
            }
            SessionError::StalePreparation { .. } => ErrorCode::StaleStep,
            SessionError::OutcomeAlreadyRecorded => ErrorCode::OutcomeAlreadyRecorded,
        }
    }
}
