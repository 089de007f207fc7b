//! Application layer - command handlers over the domain and ports.
//!
//! - `catalog` - loaded, validated tree versions and the active one
//! - `registry` - live sessions, each behind its own lock
//! - `executor` - prepare, audit, commit
//! - `context_updater` - CAS read-modify-write of user context
//! - `handlers` - one handler per engine operation
//! - `engine` - wiring of all of the above

mod catalog;
mod context_updater;
mod engine;
mod errors;
mod executor;
pub mod handlers;
mod registry;

pub use catalog::TreeCatalog;
pub use context_updater::ContextUpdater;
pub use engine::{Engine, EnginePorts, EngineSettings};
pub use errors::{EngineError, UserFallback};
pub use executor::{Execution, TransitionExecutor};
pub use registry::{SessionHandle, SessionRegistry};

#[cfg(test)]
pub(crate) mod test_support {
    //! Engine over in-memory adapters and the small sample tree.

    use super::handlers::*;
    use super::*;
    use crate::adapters::audit::InMemoryAuditRecorder;
    use crate::adapters::profile::{InMemorySafetyPlanStore, InMemoryUserContextStore};
    use crate::domain::foundation::{SessionId, TreeVersion, UserId};
    use crate::domain::safety::SafetyPlan;
    use crate::domain::session::Session;
    use crate::domain::signal::RawInput;
    use crate::domain::tree::test_support::sample_definition;
    use crate::domain::tree::TreeDefinition;
    use crate::ports::{LoaderError, TreeCatalogLoader};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    pub struct SampleLoader;

    #[async_trait]
    impl TreeCatalogLoader for SampleLoader {
        async fn load(&self, version: &TreeVersion) -> Result<TreeDefinition, LoaderError> {
            let definition = sample_definition();
            if &definition.version == version {
                Ok(definition)
            } else {
                Err(LoaderError::NotFound(version.clone()))
            }
        }

        async fn available_versions(&self) -> Result<Vec<TreeVersion>, LoaderError> {
            Ok(vec![sample_definition().version])
        }
    }

    pub fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    pub fn valid_plan(user: UserId) -> SafetyPlan {
        SafetyPlan::new(user)
            .with_warning_sign("can't sit still")
            .with_coping_strategy("cold water on face")
            .with_coping_strategy("walk around the block")
            .with_coping_strategy("text a friend")
    }

    pub fn input(intensity: i64, tags: &[&str]) -> RawInput {
        tags.iter()
            .fold(RawInput::new().with_intensity(intensity), |raw, tag| raw.with_tag(*tag))
    }

    pub struct Harness {
        pub engine: Engine,
        pub registry: Arc<SessionRegistry>,
        pub recorder: InMemoryAuditRecorder,
        pub contexts: InMemoryUserContextStore,
        pub plans: InMemorySafetyPlanStore,
        pub start_handler: Arc<StartSessionHandler>,
        pub submit_handler: Arc<SubmitInputHandler>,
        pub abort_handler: Arc<AbortSessionHandler>,
        pub outcome_handler: Arc<RecordOutcomeHandler>,
        pub replay_handler: Arc<ReplaySessionHandler>,
        pub get_handler: Arc<GetSessionHandler>,
    }

    impl Harness {
        pub async fn new() -> Self {
            Self::with_settings(EngineSettings::default()).await
        }

        pub async fn with_audit_timeout(timeout: Duration) -> Self {
            Self::with_settings(EngineSettings {
                audit_timeout: timeout,
                ..EngineSettings::default()
            })
            .await
        }

        pub async fn with_settings(settings: EngineSettings) -> Self {
            let recorder = InMemoryAuditRecorder::new();
            let contexts = InMemoryUserContextStore::new();
            let plans = InMemorySafetyPlanStore::new();
            let engine = Engine::new(
                EnginePorts {
                    catalog_loader: Arc::new(SampleLoader),
                    recorder: Arc::new(recorder.clone()),
                    contexts: Arc::new(contexts.clone()),
                    safety_plans: Arc::new(plans.clone()),
                },
                settings,
            );
            engine
                .catalog
                .load_and_activate(&TreeVersion::new("test-v1").unwrap())
                .await
                .unwrap();

            Self {
                registry: Arc::clone(&engine.registry),
                start_handler: Arc::clone(&engine.start_session),
                submit_handler: Arc::clone(&engine.submit_input),
                abort_handler: Arc::clone(&engine.abort_session),
                outcome_handler: Arc::clone(&engine.record_outcome),
                replay_handler: Arc::clone(&engine.replay_session),
                get_handler: Arc::clone(&engine.get_session),
                engine,
                recorder,
                contexts,
                plans,
            }
        }

        pub async fn give_valid_plan(&self) {
            self.plans.put(valid_plan(user())).await;
        }

        pub async fn start(&self) -> Result<StartSessionResult, EngineError> {
            self.start_handler
                .handle(StartSessionCommand {
                    user_id: user(),
                    tree_version: None,
                })
                .await
        }

        pub async fn submit(
            &self,
            session_id: SessionId,
            input: RawInput,
        ) -> Result<SubmitInputResult, EngineError> {
            self.submit_handler
                .handle(SubmitInputCommand {
                    session_id,
                    input,
                    expected_node: None,
                })
                .await
        }

        pub async fn session(&self, session_id: SessionId) -> Session {
            self.get_handler
                .handle(GetSessionQuery { session_id })
                .await
                .unwrap()
        }
    }
}
