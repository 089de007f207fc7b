//! StartSessionHandler - opens a session at the root of a tree version.

use std::sync::Arc;

use crate::application::{EngineError, SessionRegistry, TreeCatalog};
use crate::domain::foundation::{SessionId, TreeVersion, UserId};
use crate::domain::safety::SafetyPlanStatus;
use crate::domain::session::Session;
use crate::domain::user::{ContextVersion, UserContext};
use crate::ports::{SafetyPlanStore, UserContextStore};

#[derive(Debug, Clone)]
pub struct StartSessionCommand {
    pub user_id: UserId,
    /// Bind to this version instead of the active one.
    pub tree_version: Option<TreeVersion>,
}

#[derive(Debug, Clone)]
pub struct StartSessionResult {
    pub session: Session,
    /// Question to show at the root, if it asks one.
    pub prompt: Option<String>,
}

pub struct StartSessionHandler {
    catalog: Arc<TreeCatalog>,
    registry: Arc<SessionRegistry>,
    contexts: Arc<dyn UserContextStore>,
    safety_plans: Arc<dyn SafetyPlanStore>,
}

impl StartSessionHandler {
    pub fn new(
        catalog: Arc<TreeCatalog>,
        registry: Arc<SessionRegistry>,
        contexts: Arc<dyn UserContextStore>,
        safety_plans: Arc<dyn SafetyPlanStore>,
    ) -> Self {
        Self {
            catalog,
            registry,
            contexts,
            safety_plans,
        }
    }

    pub async fn handle(&self, cmd: StartSessionCommand) -> Result<StartSessionResult, EngineError> {
        // 1. Safety plan precondition
        let plan = self.safety_plans.find_by_user(&cmd.user_id).await?;
        if let Err(problem) = SafetyPlanStatus::of(plan.as_ref()).into_result() {
            tracing::info!(user_id = %cmd.user_id, problem = %problem, "session refused: safety plan");
            return Err(problem.into());
        }

        // 2. Bind a tree version
        let tree = match &cmd.tree_version {
            Some(version) => self.catalog.get_or_load(version).await?,
            None => self.catalog.active().await?,
        };

        // 3. Snapshot the user's context
        let (context, version) = match self.contexts.load(&cmd.user_id).await? {
            Some(current) => (current.context, current.version),
            None => (UserContext::new(cmd.user_id.clone()), ContextVersion::initial()),
        };

        let session = Session::start(
            SessionId::new(),
            cmd.user_id,
            tree.version().clone(),
            tree.root().clone(),
            context,
            version,
        );
        let prompt = tree
            .node(tree.root())
            .and_then(|n| n.prompt())
            .map(str::to_string);

        self.registry.insert(session.clone()).await;
        tracing::info!(
            session_id = %session.id(),
            tree_version = %session.tree_version(),
            "session started"
        );

        Ok(StartSessionResult { session, prompt })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{user, Harness};
    use crate::domain::foundation::{ErrorCode, SessionState};
    use crate::domain::safety::{SafetyPlan, SafetyPlanError};
    use crate::domain::user::Modality;

    #[tokio::test]
    async fn starts_at_root_with_prompt() {
        let h = Harness::new().await;
        h.give_valid_plan().await;

        let result = h.start().await.unwrap();
        assert_eq!(result.session.state(), SessionState::Active);
        assert_eq!(result.session.current_node().as_str(), "root");
        assert_eq!(result.prompt.as_deref(), Some("What is happening right now?"));
        assert!(h.registry.get(result.session.id()).await.is_some());
    }

    #[tokio::test]
    async fn missing_plan_blocks_the_session() {
        let h = Harness::new().await;

        let err = h.start().await.unwrap_err();
        assert_eq!(err, EngineError::Precondition(SafetyPlanError::Missing));
        assert_eq!(err.code(), ErrorCode::SafetyPlanMissing);
        assert!(h.registry.is_empty().await);
    }

    #[tokio::test]
    async fn incomplete_plan_blocks_the_session() {
        let h = Harness::new().await;
        h.plans
            .put(SafetyPlan::new(user()).with_warning_sign("racing thoughts"))
            .await;

        let err = h.start().await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Precondition(SafetyPlanError::TooFewCopingStrategies { .. })
        ));
    }

    #[tokio::test]
    async fn snapshots_stored_context() {
        let h = Harness::new().await;
        h.give_valid_plan().await;
        let version = h
            .contexts
            .put(UserContext::new(user()).with_modality(Modality::Stillness))
            .await;

        let session = h.start().await.unwrap().session;
        assert_eq!(session.context_version(), version);
        assert_eq!(
            session.context_snapshot().modality_preference(),
            Some(Modality::Stillness)
        );
    }

    #[tokio::test]
    async fn unknown_requested_version_is_an_error() {
        let h = Harness::new().await;
        h.give_valid_plan().await;

        let err = h
            .start_handler
            .handle(StartSessionCommand {
                user_id: user(),
                tree_version: Some(TreeVersion::new("missing-v1").unwrap()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TreeVersionNotFound);
    }
}
