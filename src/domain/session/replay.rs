//! Audit replay: re-run a committed trail against its bound tree version.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Session, TransitionKind};
use crate::domain::foundation::{NodeId, SessionId, SessionState, StateMachine, TreeVersion};
use crate::domain::personalization::personalize;
use crate::domain::safety::{CrisisGate, GateResult, SafetyPlanError, SafetyPlanStatus};
use crate::domain::tree::{DecisionTree, NodeResult, TraversalError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("Session is bound to {session}, replay tree is {tree}")]
    TreeVersionMismatch {
        session: TreeVersion,
        tree: TreeVersion,
    },

    #[error("Replay traversal failed: {0}")]
    Traversal(#[from] TraversalError),
}

/// First point where replay disagrees with the recorded trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Divergence {
    pub sequence: u64,
    pub recorded_kind: TransitionKind,
    pub recorded_to: NodeId,
    pub replayed_kind: Option<TransitionKind>,
    pub replayed_to: Option<NodeId>,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub session_id: SessionId,
    pub tree_version: TreeVersion,
    pub steps_replayed: usize,
    pub final_node: NodeId,
    pub final_state: SessionState,
    pub reproduced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divergence: Option<Divergence>,
}

/// Replays every trail entry from the root using the recorded signals and
/// the session's context snapshot.
///
/// # Errors
///
/// - `TreeVersionMismatch` if `tree` is not the session's version
/// - `Traversal` if a recorded node no longer steps
pub fn replay(session: &Session, tree: &DecisionTree) -> Result<ReplayReport, ReplayError> {
    if session.tree_version() != tree.version() {
        return Err(ReplayError::TreeVersionMismatch {
            session: session.tree_version().clone(),
            tree: tree.version().clone(),
        });
    }

    let gate = CrisisGate::new();
    let context = session.context_snapshot();
    let mut node = tree.root().clone();
    let mut state = SessionState::Active;
    let mut divergence = None;
    let mut steps = 0;

    for entry in session.trail() {
        steps += 1;
        let diverged = |replayed_kind, replayed_to, detail: &str| Divergence {
            sequence: entry.sequence,
            recorded_kind: entry.kind,
            recorded_to: entry.to_node.clone(),
            replayed_kind,
            replayed_to,
            detail: detail.to_string(),
        };

        if state.is_terminal() {
            divergence = Some(diverged(None, None, "transition after terminal state"));
            break;
        }
        if entry.from_node != node {
            divergence = Some(diverged(None, Some(node.clone()), "trail is not contiguous"));
            break;
        }

        if entry.kind == TransitionKind::Abort {
            state = SessionState::Aborted;
            continue;
        }

        let Some(evidence) = entry.evidence.as_ref() else {
            divergence = Some(diverged(None, None, "signal-driven entry has no evidence"));
            break;
        };

        let plan = if evidence.safety_plan_valid {
            SafetyPlanStatus::Valid
        } else {
            let problem = match &evidence.gate {
                GateResult::Escalate(r) => r.safety_plan_problem().cloned(),
                GateResult::Pass => None,
            };
            SafetyPlanStatus::Invalid(problem.unwrap_or(SafetyPlanError::Missing))
        };

        let (kind, to) = match gate.evaluate(&evidence.signal, context, &plan) {
            GateResult::Escalate(_) => (TransitionKind::Escalate, node.clone()),
            GateResult::Pass => match tree.step(&node, &evidence.signal, context)? {
                NodeResult::Advance { to } => (TransitionKind::Advance, to),
                NodeResult::Terminal { node: terminal, .. } => (TransitionKind::Complete, terminal),
            },
        };

        if kind != entry.kind || to != entry.to_node {
            divergence = Some(diverged(Some(kind), Some(to), "replayed step differs"));
            break;
        }
        node = to;
        state = kind.target_state();
    }

    if divergence.is_none() && state != session.state() {
        divergence = session.trail().last().map(|entry| Divergence {
            sequence: entry.sequence,
            recorded_kind: entry.kind,
            recorded_to: entry.to_node.clone(),
            replayed_kind: None,
            replayed_to: None,
            detail: format!("replay ends {} but session is {}", state, session.state()),
        });
    }

    if divergence.is_none() {
        if let Some(recorded) = session.recommendation() {
            let rerendered = tree
                .template(&recorded.coaching_ref)
                .map(|t| personalize(&recorded.skill_id, t, context));
            if rerendered.as_ref() != Some(recorded) {
                divergence = session.trail().last().map(|entry| Divergence {
                    sequence: entry.sequence,
                    recorded_kind: entry.kind,
                    recorded_to: entry.to_node.clone(),
                    replayed_kind: Some(TransitionKind::Complete),
                    replayed_to: Some(node.clone()),
                    detail: "rendered recommendation differs".to_string(),
                });
            }
        }
    }

    let reproduced = divergence.is_none() && node == *session.current_node();
    Ok(ReplayReport {
        session_id: *session.id(),
        tree_version: tree.version().clone(),
        steps_replayed: steps,
        final_node: node,
        final_state: state,
        reproduced,
        divergence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::domain::session::{Evidence, Transition};
    use crate::domain::signal::{Intensity, Signal, SituationCategory, TimeAvailable};
    use crate::domain::tree::test_support::{node_id, sample_tree};
    use crate::domain::user::{ContextVersion, Modality, UserContext};
    use proptest::prelude::*;

    fn new_session(tree: &DecisionTree, context: UserContext) -> Session {
        Session::start(
            SessionId::new(),
            context.user_id().clone(),
            tree.version().clone(),
            tree.root().clone(),
            context,
            ContextVersion::initial(),
        )
    }

    /// Drives a session the way the submit-input handler does, without I/O.
    fn drive(session: &mut Session, tree: &DecisionTree, signals: &[Signal], plan_valid: bool) {
        let gate = CrisisGate::new();
        let plan = if plan_valid {
            SafetyPlanStatus::Valid
        } else {
            SafetyPlanStatus::Invalid(SafetyPlanError::Missing)
        };
        for signal in signals {
            loop {
                if session.is_terminal() {
                    return;
                }
                let context = session.context_snapshot().clone();
                let result = gate.evaluate(signal, &context, &plan);
                let evidence = Evidence::new(signal, plan_valid, result.clone());
                let transition = match result {
                    GateResult::Escalate(reason) => Transition::Escalate { reason },
                    GateResult::Pass => match tree.step(session.current_node(), signal, &context).unwrap() {
                        NodeResult::Advance { to } => Transition::Advance { to },
                        NodeResult::Terminal {
                            node, coaching_ref, skill,
                        } => Transition::Complete {
                            terminal: node,
                            recommendation: personalize(
                                &skill,
                                tree.template(&coaching_ref).unwrap(),
                                &context,
                            ),
                        },
                    },
                };
                let prepared = session.prepare(transition, Some(evidence), Timestamp::now()).unwrap();
                session.commit(prepared).unwrap();
                let paused = tree
                    .node(session.current_node())
                    .and_then(|n| n.prompt())
                    .is_some();
                if paused || session.is_terminal() {
                    break;
                }
            }
        }
    }

    fn user_context() -> UserContext {
        UserContext::new(UserId::new("user-1").unwrap())
    }

    #[test]
    fn completed_session_replays_to_same_terminal() {
        let tree = sample_tree();
        let mut session = new_session(&tree, user_context().with_modality(Modality::Stillness));
        let signal = Signal::builder(Intensity::rated(3))
            .situation(SituationCategory::ImpulsiveUrge)
            .time_available(TimeAvailable::Short)
            .build();
        drive(&mut session, &tree, &[signal], true);
        assert_eq!(session.state(), SessionState::Completed);

        let report = replay(&session, &tree).unwrap();
        assert!(report.reproduced, "{report:?}");
        assert_eq!(report.final_node, node_id("tipp-leaf"));
        assert_eq!(report.steps_replayed, 2);
    }

    #[test]
    fn escalated_session_replays_as_escalation() {
        let tree = sample_tree();
        let mut session = new_session(&tree, user_context());
        drive(&mut session, &tree, &[Signal::builder(Intensity::rated(9)).build()], true);
        let report = replay(&session, &tree).unwrap();
        assert!(report.reproduced);
        assert_eq!(report.final_state, SessionState::Escalated);
    }

    #[test]
    fn replay_against_other_version_is_rejected() {
        let tree = sample_tree();
        let session = new_session(&tree, user_context());
        let mut other = crate::domain::tree::test_support::sample_definition();
        other.version = TreeVersion::new("test-v2").unwrap();
        let other = DecisionTree::from_definition(other).unwrap();
        assert!(matches!(
            replay(&session, &other),
            Err(ReplayError::TreeVersionMismatch { .. })
        ));
    }

    #[test]
    fn tampered_evidence_diverges() {
        let tree = sample_tree();
        let mut session = new_session(&tree, user_context());
        let signal = Signal::builder(Intensity::rated(3))
            .situation(SituationCategory::ImpulsiveUrge)
            .time_available(TimeAvailable::Extended)
            .build();
        drive(&mut session, &tree, &[signal], true);

        let mut json = serde_json::to_value(&session).unwrap();
        json["trail"][1]["evidence"]["signal"]["time_available"] = serde_json::json!("short");
        let tampered: Session = serde_json::from_value(json).unwrap();

        let report = replay(&tampered, &tree).unwrap();
        assert!(!report.reproduced);
        assert_eq!(report.divergence.unwrap().sequence, 1);
    }

    fn arb_signal() -> impl Strategy<Value = Signal> {
        (
            proptest::option::of(0u8..=10),
            proptest::collection::btree_set(
                proptest::sample::select(SituationCategory::ALL.to_vec()),
                0..3,
            ),
            proptest::option::of(prop_oneof![Just(TimeAvailable::Short), Just(TimeAvailable::Extended)]),
        )
            .prop_map(|(intensity, situations, time)| {
                let mut b = Signal::builder(intensity.map_or(Intensity::Unknown, Intensity::rated));
                for s in situations {
                    b = b.situation(s);
                }
                if let Some(t) = time {
                    b = b.time_available(t);
                }
                b.build()
            })
    }

    proptest! {
        #[test]
        fn replay_reproduces_every_driven_session(
            signals in proptest::collection::vec(arb_signal(), 1..4),
            plan_valid in any::<bool>(),
            stillness in any::<bool>(),
        ) {
            let tree = sample_tree();
            let mut context = user_context();
            if stillness {
                context = context.with_modality(Modality::Stillness);
            }
            let mut session = new_session(&tree, context);
            drive(&mut session, &tree, &signals, plan_valid);

            let report = replay(&session, &tree).unwrap();
            prop_assert!(report.reproduced, "{:?}", report);
            prop_assert_eq!(report.final_state, session.state());
            prop_assert_eq!(&report.final_node, session.current_node());
        }
    }
}
