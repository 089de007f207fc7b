//! Session aggregate.
//!
//! The state machine is the single authority over `current_node` and
//! `state`. Every change goes through [`Session::prepare`] followed by
//! [`Session::commit`], with the audit append happening in between.

use serde::{Deserialize, Serialize};

use super::{Evidence, SessionError, TrailEntry, Transition, TransitionKind};
use crate::domain::foundation::{
    NodeId, SessionId, SessionState, StateMachine, Timestamp, TreeVersion, UserId,
};
use crate::domain::personalization::RenderedRecommendation;
use crate::domain::safety::EscalationReason;
use crate::domain::user::{ContextVersion, UserContext};

/// User feedback on a completed session's skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedOutcome {
    pub helped: bool,
    pub reported_at: Timestamp,
}

/// A transition that has been checked but not yet applied.
///
/// Holds the trail entry that [`Session::commit`] will append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTransition {
    entry: TrailEntry,
    transition: Transition,
    next_state: SessionState,
}

impl PreparedTransition {
    pub fn entry(&self) -> &TrailEntry {
        &self.entry
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    pub fn next_state(&self) -> SessionState {
        self.next_state
    }
}

/// Aggregate root for one guided interaction.
///
/// # Invariants
///
/// - bound to one `tree_version` for its whole life
/// - `trail` is append-only, sequences are `0..len` in order
/// - once Escalated, Completed or Aborted no further transition commits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    user_id: UserId,
    tree_version: TreeVersion,
    root: NodeId,
    current_node: NodeId,
    state: SessionState,
    trail: Vec<TrailEntry>,
    context_snapshot: UserContext,
    context_version: ContextVersion,
    escalation: Option<EscalationReason>,
    recommendation: Option<RenderedRecommendation>,
    abort_reason: Option<String>,
    outcome: Option<ReportedOutcome>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Session {
    /// Starts a session at the tree root.
    pub fn start(
        id: SessionId,
        user_id: UserId,
        tree_version: TreeVersion,
        root: NodeId,
        context_snapshot: UserContext,
        context_version: ContextVersion,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            user_id,
            tree_version,
            current_node: root.clone(),
            root,
            state: SessionState::Active,
            trail: Vec::new(),
            context_snapshot,
            context_version,
            escalation: None,
            recommendation: None,
            abort_reason: None,
            outcome: None,
            created_at: now,
            updated_at: now,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn tree_version(&self) -> &TreeVersion {
        &self.tree_version
    }

    pub fn root(&self) -> &NodeId {
        &self.root
    }

    pub fn current_node(&self) -> &NodeId {
        &self.current_node
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn trail(&self) -> &[TrailEntry] {
        &self.trail
    }

    pub fn context_snapshot(&self) -> &UserContext {
        &self.context_snapshot
    }

    pub fn context_version(&self) -> ContextVersion {
        self.context_version
    }

    pub fn escalation(&self) -> Option<&EscalationReason> {
        self.escalation.as_ref()
    }

    pub fn recommendation(&self) -> Option<&RenderedRecommendation> {
        self.recommendation.as_ref()
    }

    pub fn abort_reason(&self) -> Option<&str> {
        self.abort_reason.as_deref()
    }

    pub fn outcome(&self) -> Option<&ReportedOutcome> {
        self.outcome.as_ref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Sequence the next committed transition will carry.
    pub fn next_sequence(&self) -> u64 {
        self.trail.len() as u64
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State machine
    // ─────────────────────────────────────────────────────────────────────────

    /// Checks a transition against the current state without applying it.
    ///
    /// # Errors
    ///
    /// - `InvariantViolation` if the session is already terminal
    pub fn prepare(
        &self,
        transition: Transition,
        evidence: Option<Evidence>,
        at: Timestamp,
    ) -> Result<PreparedTransition, SessionError> {
        let kind = transition.kind();
        let next_state = self
            .state
            .transition_to(kind.target_state())
            .map_err(|_| SessionError::InvariantViolation {
                state: self.state,
                attempted: kind,
            })?;

        let to_node = match &transition {
            Transition::Advance { to } => to.clone(),
            Transition::Complete { terminal, .. } => terminal.clone(),
            Transition::Escalate { .. } | Transition::Abort { .. } => self.current_node.clone(),
        };

        Ok(PreparedTransition {
            entry: TrailEntry {
                sequence: self.next_sequence(),
                kind,
                from_node: self.current_node.clone(),
                to_node,
                evidence,
                at,
            },
            transition,
            next_state,
        })
    }

    /// Applies a prepared transition.
    ///
    /// # Errors
    ///
    /// - `InvariantViolation` if the session became terminal meanwhile
    /// - `StalePreparation` if another transition committed meanwhile
    pub fn commit(&mut self, prepared: PreparedTransition) -> Result<(), SessionError> {
        if self.state.is_terminal() {
            return Err(SessionError::InvariantViolation {
                state: self.state,
                attempted: prepared.entry.kind,
            });
        }
        if prepared.entry.sequence != self.next_sequence()
            || prepared.entry.from_node != self.current_node
        {
            return Err(SessionError::StalePreparation {
                prepared: prepared.entry.sequence,
                current: self.next_sequence(),
            });
        }

        match prepared.transition {
            Transition::Advance { .. } => {}
            Transition::Escalate { reason } => self.escalation = Some(reason),
            Transition::Complete { recommendation, .. } => {
                self.recommendation = Some(recommendation)
            }
            Transition::Abort { reason } => self.abort_reason = Some(reason),
        }

        self.current_node = prepared.entry.to_node.clone();
        self.state = prepared.next_state;
        self.updated_at = prepared.entry.at;
        self.trail.push(prepared.entry);
        Ok(())
    }

    /// Records whether the recommended skill helped. Once per session.
    ///
    /// # Errors
    ///
    /// - `NotCompleted` unless the session ended with a recommendation
    /// - `OutcomeAlreadyRecorded` on a second report
    pub fn record_outcome(&mut self, helped: bool, at: Timestamp) -> Result<(), SessionError> {
        if self.state != SessionState::Completed {
            return Err(SessionError::NotCompleted(self.state));
        }
        if self.outcome.is_some() {
            return Err(SessionError::OutcomeAlreadyRecorded);
        }
        self.outcome = Some(ReportedOutcome {
            helped,
            reported_at: at,
        });
        self.updated_at = at;
        Ok(())
    }

    /// Whether `record_outcome` would succeed.
    pub fn can_record_outcome(&self) -> Result<(), SessionError> {
        if self.state != SessionState::Completed {
            return Err(SessionError::NotCompleted(self.state));
        }
        if self.outcome.is_some() {
            return Err(SessionError::OutcomeAlreadyRecorded);
        }
        Ok(())
    }

    /// The kind of the last committed transition, if any.
    pub fn last_transition(&self) -> Option<TransitionKind> {
        self.trail.last().map(|e| e.kind)
    }
}
