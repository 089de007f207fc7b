//! ReplaySessionHandler - audit replay against the bound tree version.

use std::sync::Arc;

use crate::application::{EngineError, SessionRegistry, TreeCatalog};
use crate::domain::foundation::SessionId;
use crate::domain::session::{replay, ReplayReport};

#[derive(Debug, Clone)]
pub struct ReplaySessionQuery {
    pub session_id: SessionId,
}

pub struct ReplaySessionHandler {
    catalog: Arc<TreeCatalog>,
    registry: Arc<SessionRegistry>,
}

impl ReplaySessionHandler {
    pub fn new(catalog: Arc<TreeCatalog>, registry: Arc<SessionRegistry>) -> Self {
        Self { catalog, registry }
    }

    pub async fn handle(&self, query: ReplaySessionQuery) -> Result<ReplayReport, EngineError> {
        let handle = self
            .registry
            .get(&query.session_id)
            .await
            .ok_or(EngineError::SessionNotFound(query.session_id))?;
        let session = handle.lock().await.clone();

        let tree = self.catalog.get_or_load(session.tree_version()).await?;
        let report = replay(&session, &tree)?;
        if !report.reproduced {
            tracing::warn!(
                session_id = %session.id(),
                divergence = ?report.divergence,
                "replay did not reproduce recorded session"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{input, Harness};
    use crate::domain::foundation::SessionState;

    #[tokio::test]
    async fn completed_session_reproduces() {
        let h = Harness::new().await;
        h.give_valid_plan().await;
        let id = *h.start().await.unwrap().session.id();
        h.submit(id, input(4, &["impulsive-urge", "physical-distress"]))
            .await
            .unwrap();
        h.submit(id, input(4, &["primary-concern=urge", "time-available=short"]))
            .await
            .unwrap();

        let report = h
            .replay_handler
            .handle(ReplaySessionQuery { session_id: id })
            .await
            .unwrap();
        assert!(report.reproduced, "{report:?}");
        assert_eq!(report.final_state, SessionState::Completed);
        assert_eq!(report.final_node.as_str(), "tipp-leaf");
        assert_eq!(report.steps_replayed, 3);
    }

    #[tokio::test]
    async fn aborted_session_reproduces() {
        let h = Harness::new().await;
        h.give_valid_plan().await;
        let id = *h.start().await.unwrap().session.id();
        h.submit(id, input(4, &["impulsive-urge", "physical-distress"]))
            .await
            .unwrap();
        h.abort_handler
            .handle(crate::application::handlers::AbortSessionCommand {
                session_id: id,
                reason: "timeout".into(),
            })
            .await
            .unwrap();

        let report = h
            .replay_handler
            .handle(ReplaySessionQuery { session_id: id })
            .await
            .unwrap();
        assert!(report.reproduced);
        assert_eq!(report.final_state, SessionState::Aborted);
    }
}
