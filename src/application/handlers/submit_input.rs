//! SubmitInputHandler - one round of user input through gate and tree.
//!
//! The submitted signal drives as many steps as it can: through every
//! branch node that asks no question of its own, stopping at the next
//! prompting node, a terminal, or an escalation. The crisis gate runs
//! before every individual step.

use std::sync::Arc;

use crate::application::{ContextUpdater, EngineError, SessionRegistry, TransitionExecutor, TreeCatalog};
use crate::domain::foundation::{NodeId, SessionId, SessionState, Timestamp};
use crate::domain::personalization::{personalize, RenderedRecommendation};
use crate::domain::safety::{
    CrisisGate, EscalationReason, GateResult, SafetyPlan, SafetyPlanStatus,
};
use crate::domain::session::{Evidence, Session, Transition};
use crate::domain::signal::{RawInput, Signal, SignalExtractor};
use crate::domain::tree::{DecisionTree, NodeResult, TraversalError};
use crate::ports::SafetyPlanStore;

#[derive(Debug, Clone)]
pub struct SubmitInputCommand {
    pub session_id: SessionId,
    pub input: RawInput,
    /// Node the input was answered at. Rejected if the session moved on.
    pub expected_node: Option<NodeId>,
}

/// Where the session settled after this input.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    AwaitingInput { node: NodeId, prompt: String },
    Recommended(RenderedRecommendation),
    Escalated {
        reason: EscalationReason,
        /// The user's plan as stored, shown alongside crisis resources.
        safety_plan: Option<SafetyPlan>,
    },
    Aborted { reason: Option<String> },
}

#[derive(Debug, Clone)]
pub struct SubmitInputResult {
    pub session: Session,
    pub outcome: StepOutcome,
    /// Transitions committed by this input. Zero for a no-op.
    pub transitions: usize,
}

pub struct SubmitInputHandler {
    catalog: Arc<TreeCatalog>,
    registry: Arc<SessionRegistry>,
    safety_plans: Arc<dyn SafetyPlanStore>,
    executor: Arc<TransitionExecutor>,
    context_updater: Arc<ContextUpdater>,
    extractor: SignalExtractor,
    gate: CrisisGate,
    max_steps: u32,
}

impl SubmitInputHandler {
    pub fn new(
        catalog: Arc<TreeCatalog>,
        registry: Arc<SessionRegistry>,
        safety_plans: Arc<dyn SafetyPlanStore>,
        executor: Arc<TransitionExecutor>,
        context_updater: Arc<ContextUpdater>,
        extractor: SignalExtractor,
        max_steps: u32,
    ) -> Self {
        Self {
            catalog,
            registry,
            safety_plans,
            executor,
            context_updater,
            extractor,
            gate: CrisisGate::new(),
            max_steps,
        }
    }

    pub async fn handle(&self, cmd: SubmitInputCommand) -> Result<SubmitInputResult, EngineError> {
        let handle = self
            .registry
            .get(&cmd.session_id)
            .await
            .ok_or(EngineError::SessionNotFound(cmd.session_id))?;
        let mut session = handle.lock().await;

        let tree = self
            .catalog
            .get(session.tree_version())
            .await
            .ok_or_else(|| EngineError::TreeVersionNotLoaded(session.tree_version().clone()))?;
        let plan = self.safety_plans.find_by_user(session.user_id()).await?;

        if session.is_terminal() {
            tracing::warn!(
                session_id = %session.id(),
                state = %session.state(),
                "input submitted to terminal session; ignoring"
            );
            let outcome = settled_outcome(&session, &tree, plan)?;
            return Ok(SubmitInputResult {
                session: session.clone(),
                outcome,
                transitions: 0,
            });
        }

        if let Some(expected) = &cmd.expected_node {
            if expected != session.current_node() {
                return Err(EngineError::StaleStep {
                    expected: expected.to_string(),
                    actual: session.current_node().to_string(),
                });
            }
        }

        let signal = self.extractor.extract(&cmd.input);
        let status = SafetyPlanStatus::of(plan.as_ref());
        let transitions = self.drive(&mut session, &tree, &signal, &status).await?;

        if session.is_terminal() {
            self.update_context(&session).await;
        }

        let outcome = settled_outcome(&session, &tree, plan)?;
        Ok(SubmitInputResult {
            session: session.clone(),
            outcome,
            transitions,
        })
    }

    async fn drive(
        &self,
        session: &mut Session,
        tree: &DecisionTree,
        signal: &Signal,
        plan: &SafetyPlanStatus,
    ) -> Result<usize, EngineError> {
        for taken in 0..self.max_steps as usize {
            let context = session.context_snapshot();
            let gate = self.gate.evaluate(signal, context, plan);
            let evidence = Evidence::new(signal, plan.is_valid(), gate.clone());

            let transition = match gate {
                GateResult::Escalate(reason) => Transition::Escalate { reason },
                GateResult::Pass => match tree.step(session.current_node(), signal, context)? {
                    NodeResult::Advance { to } => Transition::Advance { to },
                    NodeResult::Terminal {
                        node,
                        skill,
                        coaching_ref,
                    } => {
                        let template = tree.template(&coaching_ref).ok_or_else(|| {
                            TraversalError::UnknownNode(node.clone())
                        })?;
                        Transition::Complete {
                            recommendation: personalize(&skill, template, context),
                            terminal: node,
                        }
                    }
                },
            };

            self.executor
                .execute(session, transition, Some(evidence), Timestamp::now())
                .await?;

            let prompting = tree
                .node(session.current_node())
                .and_then(|n| n.prompt())
                .is_some();
            if session.is_terminal() || prompting {
                return Ok(taken + 1);
            }
        }

        tracing::error!(
            session_id = %session.id(),
            node = %session.current_node(),
            limit = self.max_steps,
            "auto-advance did not settle"
        );
        Err(EngineError::StepLimitExceeded {
            limit: self.max_steps,
        })
    }

    /// Folds a terminal session into the user's context.
    ///
    /// The transition is already committed and audited, so a failed write
    /// here is logged rather than returned.
    async fn update_context(&self, session: &Session) {
        let ended_at = *session.updated_at();
        let result = match session.state() {
            SessionState::Completed => {
                self.context_updater
                    .update(session.user_id(), |c| c.record_recommendation())
                    .await
            }
            SessionState::Escalated => {
                self.context_updater
                    .update(session.user_id(), |c| c.record_escalation(ended_at))
                    .await
            }
            SessionState::Active | SessionState::Aborted => return,
        };
        if let Err(e) = result {
            tracing::error!(
                session_id = %session.id(),
                error = %e,
                "user context not updated after session ended"
            );
        }
    }
}

fn settled_outcome(
    session: &Session,
    tree: &DecisionTree,
    plan: Option<SafetyPlan>,
) -> Result<StepOutcome, EngineError> {
    match session.state() {
        SessionState::Escalated => {
            let reason = session
                .escalation()
                .cloned()
                .ok_or_else(|| TraversalError::AtTerminal(session.current_node().clone()))?;
            Ok(StepOutcome::Escalated {
                reason,
                safety_plan: plan,
            })
        }
        SessionState::Completed => session
            .recommendation()
            .cloned()
            .map(StepOutcome::Recommended)
            .ok_or_else(|| TraversalError::AtTerminal(session.current_node().clone()).into()),
        SessionState::Aborted => Ok(StepOutcome::Aborted {
            reason: session.abort_reason().map(str::to_string),
        }),
        SessionState::Active => {
            let node = session.current_node();
            let prompt = tree
                .node(node)
                .and_then(|n| n.prompt())
                .unwrap_or_default()
                .to_string();
            Ok(StepOutcome::AwaitingInput {
                node: node.clone(),
                prompt,
            })
        }
    }
}
