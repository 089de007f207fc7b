//! Transitions of the session state machine and the trail entries they leave.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{NodeId, SessionState, Timestamp};
use crate::domain::personalization::RenderedRecommendation;
use crate::domain::safety::{EscalationReason, GateResult};
use crate::domain::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Advance,
    Escalate,
    Complete,
    Abort,
}

impl TransitionKind {
    /// State a session moves to under this transition.
    pub fn target_state(&self) -> SessionState {
        match self {
            TransitionKind::Advance => SessionState::Active,
            TransitionKind::Escalate => SessionState::Escalated,
            TransitionKind::Complete => SessionState::Completed,
            TransitionKind::Abort => SessionState::Aborted,
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransitionKind::Advance => "advance",
            TransitionKind::Escalate => "escalate",
            TransitionKind::Complete => "complete",
            TransitionKind::Abort => "abort",
        };
        f.write_str(s)
    }
}

/// A requested state-machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Move to another branch node, staying Active.
    Advance { to: NodeId },
    /// Crisis-gate override. Never driven by a tree predicate.
    Escalate { reason: EscalationReason },
    /// Terminal node reached and rendered.
    Complete {
        terminal: NodeId,
        recommendation: RenderedRecommendation,
    },
    /// Host-driven abort.
    Abort { reason: String },
}

impl Transition {
    pub fn kind(&self) -> TransitionKind {
        match self {
            Transition::Advance { .. } => TransitionKind::Advance,
            Transition::Escalate { .. } => TransitionKind::Escalate,
            Transition::Complete { .. } => TransitionKind::Complete,
            Transition::Abort { .. } => TransitionKind::Abort,
        }
    }
}

/// What the gate saw when a signal-driven transition was decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub signal: Signal,
    pub safety_plan_valid: bool,
    pub gate: GateResult,
}

impl Evidence {
    /// Builds evidence from the signal's audit snapshot.
    pub fn new(signal: &Signal, safety_plan_valid: bool, gate: GateResult) -> Self {
        Self {
            signal: signal.audit_snapshot(),
            safety_plan_valid,
            gate,
        }
    }
}

/// One committed step of a session. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailEntry {
    pub sequence: u64,
    pub kind: TransitionKind,
    pub from_node: NodeId,
    pub to_node: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
    pub at: Timestamp,
}
