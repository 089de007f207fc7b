//! Wiring: builds every handler over one set of ports.

use std::sync::Arc;
use std::time::Duration;

use super::handlers::{
    AbortSessionHandler, GetProfileHandler, GetSessionHandler, RecordOutcomeHandler,
    ReplaySessionHandler, SaveSafetyPlanHandler, StartSessionHandler, SubmitInputHandler,
    UpdatePreferencesHandler,
};
use super::{ContextUpdater, SessionRegistry, TransitionExecutor, TreeCatalog};
use crate::domain::signal::SignalExtractor;
use crate::ports::{AuditRecorder, SafetyPlanStore, TreeCatalogLoader, UserContextStore};

/// Tunables for the engine. There is no setting that disables the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub audit_timeout: Duration,
    pub context_cas_max_retries: u32,
    pub max_auto_advance_steps: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            audit_timeout: Duration::from_millis(2000),
            context_cas_max_retries: 5,
            max_auto_advance_steps: 32,
        }
    }
}

/// External collaborators the engine runs against.
#[derive(Clone)]
pub struct EnginePorts {
    pub catalog_loader: Arc<dyn TreeCatalogLoader>,
    pub recorder: Arc<dyn AuditRecorder>,
    pub contexts: Arc<dyn UserContextStore>,
    pub safety_plans: Arc<dyn SafetyPlanStore>,
}

#[derive(Clone)]
pub struct Engine {
    pub catalog: Arc<TreeCatalog>,
    pub registry: Arc<SessionRegistry>,
    pub start_session: Arc<StartSessionHandler>,
    pub submit_input: Arc<SubmitInputHandler>,
    pub abort_session: Arc<AbortSessionHandler>,
    pub record_outcome: Arc<RecordOutcomeHandler>,
    pub replay_session: Arc<ReplaySessionHandler>,
    pub get_session: Arc<GetSessionHandler>,
    pub update_preferences: Arc<UpdatePreferencesHandler>,
    pub save_safety_plan: Arc<SaveSafetyPlanHandler>,
    pub get_profile: Arc<GetProfileHandler>,
}

impl Engine {
    pub fn new(ports: EnginePorts, settings: EngineSettings) -> Self {
        let catalog = Arc::new(TreeCatalog::new(ports.catalog_loader));
        let registry = Arc::new(SessionRegistry::new());
        let executor = Arc::new(TransitionExecutor::new(
            ports.recorder,
            settings.audit_timeout,
        ));
        let context_updater = Arc::new(ContextUpdater::new(
            Arc::clone(&ports.contexts),
            settings.context_cas_max_retries,
        ));

        Self {
            start_session: Arc::new(StartSessionHandler::new(
                Arc::clone(&catalog),
                Arc::clone(&registry),
                Arc::clone(&ports.contexts),
                Arc::clone(&ports.safety_plans),
            )),
            submit_input: Arc::new(SubmitInputHandler::new(
                Arc::clone(&catalog),
                Arc::clone(&registry),
                Arc::clone(&ports.safety_plans),
                Arc::clone(&executor),
                Arc::clone(&context_updater),
                SignalExtractor::default(),
                settings.max_auto_advance_steps,
            )),
            abort_session: Arc::new(AbortSessionHandler::new(
                Arc::clone(&registry),
                Arc::clone(&executor),
            )),
            record_outcome: Arc::new(RecordOutcomeHandler::new(
                Arc::clone(&registry),
                executor,
                Arc::clone(&context_updater),
            )),
            update_preferences: Arc::new(UpdatePreferencesHandler::new(context_updater)),
            save_safety_plan: Arc::new(SaveSafetyPlanHandler::new(Arc::clone(&ports.safety_plans))),
            get_profile: Arc::new(GetProfileHandler::new(ports.contexts, ports.safety_plans)),
            replay_session: Arc::new(ReplaySessionHandler::new(
                Arc::clone(&catalog),
                Arc::clone(&registry),
            )),
            get_session: Arc::new(GetSessionHandler::new(Arc::clone(&registry))),
            catalog,
            registry,
        }
    }
}
