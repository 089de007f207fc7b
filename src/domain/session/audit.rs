//! Audit records mirrored to the external recorder before each commit.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use super::{PreparedTransition, Session, TransitionKind};
use crate::domain::foundation::{AuditRecordId, NodeId, SessionId, Timestamp, TreeVersion, UserId};
use crate::domain::safety::GateResult;
use crate::domain::signal::Signal;

/// What an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    Transition(TransitionKind),
    OutcomeReported,
}

/// Append-only record of one safety-relevant step.
///
/// `record_id` is derived from `(session_id, sequence)` and the record's
/// content, so resending the same record deduplicates while a different
/// transition prepared at the same sequence gets its own id. When several
/// records share a sequence, the last one appended is the one that was
/// committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub record_id: AuditRecordId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub sequence: u64,
    pub event: AuditEvent,
    pub from_node: NodeId,
    pub to_node: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<Signal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_plan_valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_helped: Option<bool>,
    pub tree_version: TreeVersion,
    pub timestamp: Timestamp,
}

impl AuditRecord {
    /// Record for a prepared, not yet committed, transition.
    pub fn for_transition(session: &Session, prepared: &PreparedTransition) -> Self {
        let entry = prepared.entry();
        let evidence = entry.evidence.as_ref();
        Self {
            record_id: AuditRecordId::derive(session.id(), entry.sequence, &[]),
            session_id: *session.id(),
            user_id: session.user_id().clone(),
            sequence: entry.sequence,
            event: AuditEvent::Transition(entry.kind),
            from_node: entry.from_node.clone(),
            to_node: entry.to_node.clone(),
            signal: evidence.map(|e| e.signal.clone()),
            safety_plan_valid: evidence.map(|e| e.safety_plan_valid),
            gate: evidence.map(|e| e.gate.clone()),
            skill_helped: None,
            tree_version: session.tree_version().clone(),
            timestamp: entry.at,
        }
        .sealed()
    }

    /// Record for an outcome report on a completed session.
    ///
    /// Uses the sequence after the last trail entry; a terminal session
    /// never appends again, so the id cannot collide.
    pub fn for_outcome(session: &Session, helped: bool, at: Timestamp) -> Self {
        let sequence = session.next_sequence();
        Self {
            record_id: AuditRecordId::derive(session.id(), sequence, &[]),
            session_id: *session.id(),
            user_id: session.user_id().clone(),
            sequence,
            event: AuditEvent::OutcomeReported,
            from_node: session.current_node().clone(),
            to_node: session.current_node().clone(),
            signal: None,
            safety_plan_valid: None,
            gate: None,
            skill_helped: Some(helped),
            tree_version: session.tree_version().clone(),
            timestamp: at,
        }
        .sealed()
    }

    /// Recomputes `record_id` from the session, sequence and content.
    /// The timestamp is not part of the content.
    pub fn sealed(mut self) -> Self {
        let content = (
            &self.user_id,
            &self.event,
            &self.from_node,
            &self.to_node,
            &self.signal,
            &self.safety_plan_valid,
            &self.gate,
            &self.skill_helped,
            &self.tree_version,
        );
        let encoded = serde_json::to_vec(&content).unwrap_or_default();
        let digest = Sha256::digest(&encoded);
        self.record_id = AuditRecordId::derive(&self.session_id, self.sequence, digest.as_slice());
        self
    }
}

/// The committed view of one session's audit log: the last record appended
/// at each sequence, in sequence order.
pub fn committed_records(records: &[AuditRecord]) -> Vec<&AuditRecord> {
    let mut by_sequence = BTreeMap::new();
    for record in records {
        by_sequence.insert(record.sequence, record);
    }
    by_sequence.into_values().collect()
}
