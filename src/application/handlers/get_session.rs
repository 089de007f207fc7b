//! GetSessionHandler - read view of one session.

use std::sync::Arc;

use crate::application::{EngineError, SessionRegistry};
use crate::domain::foundation::SessionId;
use crate::domain::session::Session;

#[derive(Debug, Clone)]
pub struct GetSessionQuery {
    pub session_id: SessionId,
}

pub struct GetSessionHandler {
    registry: Arc<SessionRegistry>,
}

impl GetSessionHandler {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub async fn handle(&self, query: GetSessionQuery) -> Result<Session, EngineError> {
        let handle = self
            .registry
            .get(&query.session_id)
            .await
            .ok_or(EngineError::SessionNotFound(query.session_id))?;
        let session = handle.lock().await;
        Ok(session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::Harness;

    #[tokio::test]
    async fn returns_registered_session() {
        let h = Harness::new().await;
        h.give_valid_plan().await;
        let started = h.start().await.unwrap().session;

        let found = h
            .get_handler
            .handle(GetSessionQuery {
                session_id: *started.id(),
            })
            .await
            .unwrap();
        assert_eq!(found, started);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let h = Harness::new().await;
        let id = SessionId::new();
        assert_eq!(
            h.get_handler.handle(GetSessionQuery { session_id: id }).await,
            Err(EngineError::SessionNotFound(id))
        );
    }
}
