//! Decision Tree Engine - one deterministic step along a validated tree.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{DecisionTree, NodeKind};
use crate::domain::foundation::{CoachingRef, ErrorCode, NodeId, SkillId};
use crate::domain::signal::Signal;
use crate::domain::user::UserContext;

/// Result of applying one branch predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum NodeResult {
    /// Moved to another branch node.
    Advance { to: NodeId },
    /// Reached a terminal recommendation node.
    Terminal {
        node: NodeId,
        skill: SkillId,
        coaching_ref: CoachingRef,
    },
}

impl NodeResult {
    pub fn target(&self) -> &NodeId {
        match self {
            NodeResult::Advance { to } => to,
            NodeResult::Terminal { node, .. } => node,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalError {
    #[error("Node {0} is not part of this tree version")]
    UnknownNode(NodeId),

    #[error("Node {0} is terminal and has no outgoing edges")]
    AtTerminal(NodeId),

    #[error("No edge at {node} for outcome {outcome}")]
    UnmatchedOutcome { node: NodeId, outcome: String },
}

impl TraversalError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::TraversalError
    }
}

impl DecisionTree {
    /// Applies the predicate at `at` to the signal and context.
    ///
    /// Pure: the same inputs always produce the same result.
    ///
    /// # Errors
    ///
    /// - `UnknownNode` if `at` is not in this version
    /// - `AtTerminal` if `at` has no predicate
    /// - `UnmatchedOutcome` if no edge carries the computed outcome
    pub fn step(
        &self,
        at: &NodeId,
        signal: &Signal,
        context: &UserContext,
    ) -> Result<NodeResult, TraversalError> {
        let node = self
            .node(at)
            .ok_or_else(|| TraversalError::UnknownNode(at.clone()))?;

        let (predicate, edges) = match &node.kind {
            NodeKind::Branch {
                predicate, edges, ..
            } => (predicate, edges),
            NodeKind::Terminal { .. } => return Err(TraversalError::AtTerminal(at.clone())),
        };

        let outcome = predicate.evaluate(signal, context);
        let edge = edges
            .iter()
            .find(|e| e.when == outcome.label())
            .ok_or_else(|| TraversalError::UnmatchedOutcome {
                node: at.clone(),
                outcome: outcome.label().to_string(),
            })?;

        let target = self
            .node(&edge.to)
            .ok_or_else(|| TraversalError::UnknownNode(edge.to.clone()))?;

        tracing::debug!(
            tree = %self.version(),
            from = %at,
            to = %target.id,
            %predicate,
            %outcome,
            "tree step"
        );

        Ok(match &target.kind {
            NodeKind::Branch { .. } => NodeResult::Advance {
                to: target.id.clone(),
            },
            NodeKind::Terminal {
                skill,
                coaching_ref,
            } => NodeResult::Terminal {
                node: target.id.clone(),
                skill: skill.clone(),
                coaching_ref: coaching_ref.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::domain::signal::{Intensity, PrimaryConcern, SituationCategory, TimeAvailable};
    use crate::domain::tree::test_support::{node_id, sample_tree};

    fn ctx() -> UserContext {
        UserContext::new(UserId::new("user-1").unwrap())
    }

    #[test]
    fn impulsive_urge_advances_to_time_question() {
        let tree = sample_tree();
        let signal = Signal::builder(Intensity::rated(3))
            .situation(SituationCategory::ImpulsiveUrge)
            .build();
        assert_eq!(
            tree.step(tree.root(), &signal, &ctx()).unwrap(),
            NodeResult::Advance { to: node_id("time") }
        );
    }

    #[test]
    fn short_time_reaches_tipp() {
        let tree = sample_tree();
        let signal = Signal::builder(Intensity::rated(3))
            .situation(SituationCategory::ImpulsiveUrge)
            .time_available(TimeAvailable::Short)
            .build();
        match tree.step(&node_id("time"), &signal, &ctx()).unwrap() {
            NodeResult::Terminal { skill, .. } => assert_eq!(skill.as_str(), "tipp"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ambiguous_situation_routes_to_disambiguation() {
        let tree = sample_tree();
        let signal = Signal::builder(Intensity::rated(4))
            .situation(SituationCategory::ImpulsiveUrge)
            .situation(SituationCategory::PhysicalDistress)
            .build();
        let result = tree.step(tree.root(), &signal, &ctx()).unwrap();
        assert_eq!(result.target(), &node_id("clarify"));
        assert!(tree.node(result.target()).unwrap().prompt().is_some());
    }

    #[test]
    fn answer_at_disambiguation_continues() {
        let tree = sample_tree();
        let signal = Signal::builder(Intensity::rated(4))
            .primary_concern(PrimaryConcern::Urge)
            .build();
        assert_eq!(
            tree.step(&node_id("clarify"), &signal, &ctx()).unwrap(),
            NodeResult::Advance { to: node_id("time") }
        );
    }

    #[test]
    fn stepping_from_terminal_is_an_error() {
        let tree = sample_tree();
        let signal = Signal::builder(Intensity::rated(1)).build();
        assert_eq!(
            tree.step(&node_id("tipp-leaf"), &signal, &ctx()),
            Err(TraversalError::AtTerminal(node_id("tipp-leaf")))
        );
    }

    #[test]
    fn unknown_node_is_an_error() {
        let tree = sample_tree();
        let signal = Signal::builder(Intensity::rated(1)).build();
        assert!(matches!(
            tree.step(&node_id("elsewhere"), &signal, &ctx()),
            Err(TraversalError::UnknownNode(_))
        ));
    }

    #[test]
    fn step_is_deterministic() {
        let tree = sample_tree();
        let signal = Signal::builder(Intensity::Unknown)
            .situation(SituationCategory::Rumination)
            .build();
        let first = tree.step(tree.root(), &signal, &ctx());
        for _ in 0..10 {
            assert_eq!(tree.step(tree.root(), &signal, &ctx()), first);
        }
    }
}
