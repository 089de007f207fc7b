//! Engine-level error type returned by every application handler.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{ErrorCode, SessionId, TreeVersion};
use crate::domain::safety::SafetyPlanError;
use crate::domain::session::{ReplayError, SessionError};
use crate::domain::tree::{StructuralError, TraversalError};
use crate::ports::{LoaderError, RecorderError, StoreError};

/// What the presentation layer shows instead of a raw error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserFallback {
    /// Crisis resources and the user's safety plan.
    ShowEscalationPath,
    /// "Please try again."
    TryAgain,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Session {0} not found")]
    SessionNotFound(SessionId),

    #[error("Safety plan precondition failed: {0}")]
    Precondition(#[from] SafetyPlanError),

    #[error("Tree version is structurally invalid: {0}")]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Traversal(#[from] TraversalError),

    #[error(transparent)]
    Recorder(#[from] RecorderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error("No tree version is active")]
    NoActiveVersion,

    #[error("Tree version {0} is not loaded")]
    TreeVersionNotLoaded(TreeVersion),

    #[error("Tree version {0} is already loaded with different content")]
    FingerprintConflict(TreeVersion),

    #[error("Input was for node {expected} but the session is at {actual}")]
    StaleStep { expected: String, actual: String },

    #[error("User context update conflicted {attempts} times")]
    ContextConflict { attempts: u32 },

    #[error("Traversal did not settle within {limit} steps")]
    StepLimitExceeded { limit: u32 },
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            EngineError::Precondition(e) => e.code(),
            EngineError::Structural(e) => e.code(),
            EngineError::Loader(e) => e.code(),
            EngineError::Traversal(e) => e.code(),
            EngineError::Recorder(e) => e.code(),
            EngineError::Store(e) => e.code(),
            EngineError::Session(e) => e.code(),
            EngineError::Replay(ReplayError::TreeVersionMismatch { .. }) => {
                ErrorCode::TreeVersionNotFound
            }
            EngineError::Replay(ReplayError::Traversal(e)) => e.code(),
            EngineError::NoActiveVersion | EngineError::TreeVersionNotLoaded(_) => {
                ErrorCode::TreeVersionNotFound
            }
            EngineError::FingerprintConflict(_) => ErrorCode::StructuralError,
            EngineError::StaleStep { .. } => ErrorCode::StaleStep,
            EngineError::ContextConflict { .. } => ErrorCode::ContextConflict,
            EngineError::StepLimitExceeded { .. } => ErrorCode::TraversalError,
        }
    }

    /// Whether the caller may resubmit the same request unchanged.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            EngineError::Recorder(_)
                | EngineError::Store(StoreError::Unavailable(_))
                | EngineError::ContextConflict { .. }
                | EngineError::StaleStep { .. }
        )
    }

    /// Safe fallback for the user. Anything not retriable falls back to
    /// the escalation path.
    pub fn user_fallback(&self) -> UserFallback {
        if self.is_retriable() {
            UserFallback::TryAgain
        } else {
            UserFallback::ShowEscalationPath
        }
    }
}
