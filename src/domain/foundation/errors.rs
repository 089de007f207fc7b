//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,

    // Not found errors
    SessionNotFound,
    TreeVersionNotFound,

    // Precondition errors
    SafetyPlanMissing,
    SafetyPlanIncomplete,

    // Catalog errors
    StructuralError,
    TraversalError,

    // State errors
    InvalidStateTransition,
    StaleStep,
    OutcomeAlreadyRecorded,

    // Infrastructure errors
    RecorderUnavailable,
    RecorderTimeout,
    ContextConflict,
    StorageError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::SessionNotFound => "SESSION_NOT_FOUND",
            ErrorCode::TreeVersionNotFound => "TREE_VERSION_NOT_FOUND",
            ErrorCode::SafetyPlanMissing => "SAFETY_PLAN_MISSING",
            ErrorCode::SafetyPlanIncomplete => "SAFETY_PLAN_INCOMPLETE",
            ErrorCode::StructuralError => "STRUCTURAL_ERROR",
            ErrorCode::TraversalError => "TRAVERSAL_ERROR",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::StaleStep => "STALE_STEP",
            ErrorCode::OutcomeAlreadyRecorded => "OUTCOME_ALREADY_RECORDED",
            ErrorCode::RecorderUnavailable => "RECORDER_UNAVAILABLE",
            ErrorCode::RecorderTimeout => "RECORDER_TIMEOUT",
            ErrorCode::ContextConflict => "CONTEXT_CONFLICT",
            ErrorCode::StorageError => "STORAGE_ERROR",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_out_of_range_displays_correctly() {
        let err = ValidationError::out_of_range("intensity", 0, 10, 12);
        assert_eq!(
            format!("{}", err),
            "Field 'intensity' must be between 0 and 10, got 12"
        );
    }
}
