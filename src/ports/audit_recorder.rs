//! AuditRecorder port - durable, append-only sink for transition records.
//!
//! The recorder is an external collaborator. It must support at-least-once
//! durable append with idempotent dedup on the caller-supplied record id.
//! Records are keyed by `(session_id, sequence)`: appending the id that is
//! already latest at its slot is a success with nothing written, and any
//! other record is appended and becomes the slot's latest.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::ErrorCode;
use crate::domain::session::AuditRecord;

/// Acknowledgement from the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendReceipt {
    /// The record was newly stored.
    Appended,
    /// This id is already the latest at its slot; nothing written.
    Duplicate,
}

/// The recorder could not durably accept a record.
///
/// Always retriable: the caller may resubmit the same transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecorderError {
    #[error("Audit recorder unavailable: {0}")]
    Unavailable(String),

    #[error("Audit recorder did not acknowledge within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl RecorderError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        RecorderError::Unavailable(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            RecorderError::Unavailable(_) => ErrorCode::RecorderUnavailable,
            RecorderError::Timeout { .. } => ErrorCode::RecorderTimeout,
        }
    }
}

#[async_trait]
pub trait AuditRecorder: Send + Sync {
    /// Durably append a record, deduplicating against the latest id at
    /// `(record.session_id, record.sequence)`.
    async fn append(&self, record: &AuditRecord) -> Result<AppendReceipt, RecorderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_recorder_is_object_safe() {
        fn _accepts_dyn(_recorder: &dyn AuditRecorder) {}
    }

    #[test]
    fn errors_map_to_codes() {
        assert_eq!(
            RecorderError::unavailable("down").code(),
            ErrorCode::RecorderUnavailable
        );
        assert_eq!(
            RecorderError::Timeout { timeout_ms: 10 }.code(),
            ErrorCode::RecorderTimeout
        );
    }
}
