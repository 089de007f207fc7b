//! AbortSessionHandler - external cancellation from the hosting layer.

use std::sync::Arc;

use crate::application::{EngineError, Execution, SessionRegistry, TransitionExecutor};
use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::session::{Session, Transition};

#[derive(Debug, Clone)]
pub struct AbortSessionCommand {
    pub session_id: SessionId,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct AbortSessionResult {
    pub session: Session,
    /// False when the session had already ended.
    pub applied: bool,
}

pub struct AbortSessionHandler {
    registry: Arc<SessionRegistry>,
    executor: Arc<TransitionExecutor>,
}

impl AbortSessionHandler {
    pub fn new(registry: Arc<SessionRegistry>, executor: Arc<TransitionExecutor>) -> Self {
        Self { registry, executor }
    }

    pub async fn handle(&self, cmd: AbortSessionCommand) -> Result<AbortSessionResult, EngineError> {
        let handle = self
            .registry
            .get(&cmd.session_id)
            .await
            .ok_or(EngineError::SessionNotFound(cmd.session_id))?;
        let mut session = handle.lock().await;

        let execution = self
            .executor
            .execute(
                &mut session,
                Transition::Abort { reason: cmd.reason },
                None,
                Timestamp::now(),
            )
            .await?;

        if execution != Execution::Ignored {
            tracing::info!(session_id = %session.id(), "session aborted");
        }
        Ok(AbortSessionResult {
            session: session.clone(),
            applied: execution != Execution::Ignored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{input, Harness};
    use crate::domain::foundation::SessionState;

    fn abort(session_id: SessionId) -> AbortSessionCommand {
        AbortSessionCommand {
            session_id,
            reason: "user navigated away".to_string(),
        }
    }

    #[tokio::test]
    async fn aborts_mid_tree() {
        let h = Harness::new().await;
        h.give_valid_plan().await;
        let id = *h.start().await.unwrap().session.id();
        h.submit(id, input(4, &["impulsive-urge", "physical-distress"]))
            .await
            .unwrap();

        let result = h.abort_handler.handle(abort(id)).await.unwrap();
        assert!(result.applied);
        assert_eq!(result.session.state(), SessionState::Aborted);
        assert_eq!(result.session.current_node().as_str(), "clarify");
        assert_eq!(result.session.abort_reason(), Some("user navigated away"));
        assert_eq!(h.recorder.len().await, 2);
    }

    #[tokio::test]
    async fn abort_on_terminal_session_is_a_no_op() {
        let h = Harness::new().await;
        h.give_valid_plan().await;
        let id = *h.start().await.unwrap().session.id();
        h.submit(id, input(3, &["rumination"])).await.unwrap();

        let result = h.abort_handler.handle(abort(id)).await.unwrap();
        assert!(!result.applied);
        assert_eq!(result.session.state(), SessionState::Completed);
        assert_eq!(h.recorder.len().await, 1);
    }

    #[tokio::test]
    async fn abort_is_audited_before_commit() {
        let h = Harness::new().await;
        h.give_valid_plan().await;
        let id = *h.start().await.unwrap().session.id();
        h.recorder.fail_next(1);

        assert!(h.abort_handler.handle(abort(id)).await.is_err());
        assert_eq!(h.session(id).await.state(), SessionState::Active);
    }
}
