//! Transition executor: prepare → audit append → commit.
//!
//! A transition is committed only after the recorder acknowledged it. On
//! any recorder failure the session stays at its prior committed state.

use std::sync::Arc;
use std::time::Duration;

use super::EngineError;
use crate::domain::foundation::Timestamp;
use crate::domain::session::{AuditRecord, Evidence, Session, Transition, TransitionKind};
use crate::ports::{AppendReceipt, AuditRecorder, RecorderError};

/// What happened to a requested transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    Committed(TransitionKind),
    /// The session was already terminal. Nothing was audited or changed.
    Ignored,
}

pub struct TransitionExecutor {
    recorder: Arc<dyn AuditRecorder>,
    timeout: Duration,
}

impl TransitionExecutor {
    pub fn new(recorder: Arc<dyn AuditRecorder>, timeout: Duration) -> Self {
        Self { recorder, timeout }
    }

    pub async fn execute(
        &self,
        session: &mut Session,
        transition: Transition,
        evidence: Option<Evidence>,
        at: Timestamp,
    ) -> Result<Execution, EngineError> {
        if session.is_terminal() {
            tracing::warn!(
                session_id = %session.id(),
                state = %session.state(),
                attempted = %transition.kind(),
                "transition attempted on terminal session; ignoring"
            );
            return Ok(Execution::Ignored);
        }

        let prepared = session.prepare(transition, evidence, at)?;
        let record = AuditRecord::for_transition(session, &prepared);
        self.append(&record).await?;

        let kind = prepared.entry().kind;
        session.commit(prepared)?;
        tracing::debug!(
            session_id = %session.id(),
            sequence = record.sequence,
            kind = %kind,
            to = %session.current_node(),
            "transition committed"
        );
        Ok(Execution::Committed(kind))
    }

    /// Appends a record under the configured timeout.
    pub async fn append(&self, record: &AuditRecord) -> Result<AppendReceipt, RecorderError> {
        let result = match tokio::time::timeout(self.timeout, self.recorder.append(record)).await {
            Ok(result) => result,
            Err(_) => Err(RecorderError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };

        match &result {
            Ok(AppendReceipt::Duplicate) => tracing::debug!(
                record_id = %record.record_id,
                "audit record already stored"
            ),
            Ok(AppendReceipt::Appended) => {}
            Err(e) => tracing::error!(
                session_id = %record.session_id,
                sequence = record.sequence,
                error = %e,
                "audit append failed; transition not committed"
            ),
        }
        result
    }
}
