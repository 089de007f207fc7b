//! RecordOutcomeHandler - whether the recommended skill helped.

use std::sync::Arc;

use crate::application::{ContextUpdater, EngineError, SessionRegistry, TransitionExecutor};
use crate::domain::foundation::{SessionId, SessionState, Timestamp};
use crate::domain::session::{AuditRecord, Session, SessionError};
use crate::domain::user::ContextVersion;

#[derive(Debug, Clone)]
pub struct RecordOutcomeCommand {
    pub session_id: SessionId,
    pub helped: bool,
}

#[derive(Debug, Clone)]
pub struct RecordOutcomeResult {
    pub session: Session,
    pub context_version: ContextVersion,
}

pub struct RecordOutcomeHandler {
    registry: Arc<SessionRegistry>,
    executor: Arc<TransitionExecutor>,
    context_updater: Arc<ContextUpdater>,
}

impl RecordOutcomeHandler {
    pub fn new(
        registry: Arc<SessionRegistry>,
        executor: Arc<TransitionExecutor>,
        context_updater: Arc<ContextUpdater>,
    ) -> Self {
        Self {
            registry,
            executor,
            context_updater,
        }
    }

    /// Audits the report, folds it into the user's history, then marks the
    /// session. A failure before the last step leaves the session open to
    /// a retry. An identical retry deduplicates in the recorder; a changed
    /// report is appended and supersedes the earlier record.
    pub async fn handle(&self, cmd: RecordOutcomeCommand) -> Result<RecordOutcomeResult, EngineError> {
        let handle = self
            .registry
            .get(&cmd.session_id)
            .await
            .ok_or(EngineError::SessionNotFound(cmd.session_id))?;
        let mut session = handle.lock().await;

        session.can_record_outcome()?;
        let recommendation = session
            .recommendation()
            .cloned()
            .ok_or(SessionError::NotCompleted(SessionState::Completed))?;

        let at = Timestamp::now();
        let record = AuditRecord::for_outcome(&session, cmd.helped, at);
        self.executor.append(&record).await?;

        let context_version = self
            .context_updater
            .update(session.user_id(), |c| {
                c.record_outcome(
                    &recommendation.skill_id,
                    recommendation.variant_id.as_ref(),
                    cmd.helped,
                )
            })
            .await?;

        session.record_outcome(cmd.helped, at)?;
        tracing::info!(
            session_id = %session.id(),
            skill = %recommendation.skill_id,
            helped = cmd.helped,
            "skill outcome recorded"
        );

        Ok(RecordOutcomeResult {
            session: session.clone(),
            context_version,
        })
    }
}
