//! Decision nodes.

use serde::{Deserialize, Serialize};

use super::Predicate;
use crate::domain::foundation::{CoachingRef, NodeId, SkillId};

/// One labelled edge out of a branch node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Outcome label from the predicate's domain.
    pub when: String,
    pub to: NodeId,
}

impl Edge {
    pub fn new(when: impl Into<String>, to: NodeId) -> Self {
        Self {
            when: when.into(),
            to,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Branch {
        predicate: Predicate,
        edges: Vec<Edge>,
        /// Question shown when traversal pauses here for new input.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prompt: Option<String>,
    },
    Terminal {
        skill: SkillId,
        coaching_ref: CoachingRef,
    },
}

/// Immutable node of a published tree version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNode {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl DecisionNode {
    pub fn branch(id: NodeId, predicate: Predicate, edges: Vec<Edge>) -> Self {
        Self {
            id,
            kind: NodeKind::Branch {
                predicate,
                edges,
                prompt: None,
            },
        }
    }

    pub fn terminal(id: NodeId, skill: SkillId, coaching_ref: CoachingRef) -> Self {
        Self {
            id,
            kind: NodeKind::Terminal { skill, coaching_ref },
        }
    }

    /// Adds a prompt to a branch node. No effect on terminals.
    pub fn with_prompt(mut self, text: impl Into<String>) -> Self {
        if let NodeKind::Branch { prompt, .. } = &mut self.kind {
            *prompt = Some(text.into());
        }
        self
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal { .. })
    }

    pub fn prompt(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Branch { prompt, .. } => prompt.as_deref(),
            NodeKind::Terminal { .. } => None,
        }
    }

    /// Outgoing edges. Empty for terminals.
    pub fn edges(&self) -> &[Edge] {
        match &self.kind {
            NodeKind::Branch { edges, .. } => edges,
            NodeKind::Terminal { .. } => &[],
        }
    }
}
