//! Data Transfer Objects for session endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::StepOutcome;
use crate::application::{EngineError, UserFallback};
use crate::domain::foundation::{ErrorCode, NodeId, SessionState, Timestamp};
use crate::domain::personalization::RenderedRecommendation;
use crate::domain::safety::{EscalationReason, SafetyPlan};
use crate::domain::session::{ReportedOutcome, Session, TransitionKind};
use crate::domain::signal::RawInput;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct StartSessionRequest {
    pub user_id: String,
    #[serde(default)]
    pub tree_version: Option<String>,
}

/// Input for one step. `input` accepts any JSON; malformed fields degrade
/// rather than fail.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitInputRequest {
    #[serde(default)]
    pub input: RawInput,
    #[serde(default)]
    pub expected_node: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AbortSessionRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordOutcomeRequest {
    pub helped: bool,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailEntryResponse {
    pub sequence: u64,
    pub kind: TransitionKind,
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub at: Timestamp,
}

/// Session view. Signals are omitted; they are available through replay
/// and the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub user_id: String,
    pub tree_version: String,
    pub state: SessionState,
    pub current_node: String,
    pub trail: Vec<TrailEntryResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation: Option<EscalationReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<RenderedRecommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ReportedOutcome>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id().to_string(),
            user_id: session.user_id().to_string(),
            tree_version: session.tree_version().to_string(),
            state: session.state(),
            current_node: session.current_node().to_string(),
            trail: session
                .trail()
                .iter()
                .map(|e| TrailEntryResponse {
                    sequence: e.sequence,
                    kind: e.kind,
                    from_node: e.from_node.clone(),
                    to_node: e.to_node.clone(),
                    at: e.at,
                })
                .collect(),
            escalation: session.escalation().cloned(),
            recommendation: session.recommendation().cloned(),
            abort_reason: session.abort_reason().map(str::to_string),
            outcome: session.outcome().copied(),
            created_at: *session.created_at(),
            updated_at: *session.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub session: SessionResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcomeResponse {
    AwaitingInput {
        node: String,
        prompt: String,
    },
    Recommended {
        recommendation: RenderedRecommendation,
    },
    Escalated {
        reason: EscalationReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        safety_plan: Option<SafetyPlan>,
    },
    Aborted {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl From<StepOutcome> for StepOutcomeResponse {
    fn from(outcome: StepOutcome) -> Self {
        match outcome {
            StepOutcome::AwaitingInput { node, prompt } => StepOutcomeResponse::AwaitingInput {
                node: node.to_string(),
                prompt,
            },
            StepOutcome::Recommended(recommendation) => {
                StepOutcomeResponse::Recommended { recommendation }
            }
            StepOutcome::Escalated {
                reason,
                safety_plan,
            } => StepOutcomeResponse::Escalated {
                reason,
                safety_plan,
            },
            StepOutcome::Aborted { reason } => StepOutcomeResponse::Aborted { reason },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitInputResponse {
    pub session: SessionResponse,
    pub outcome: StepOutcomeResponse,
    pub transitions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbortSessionResponse {
    pub session: SessionResponse,
    pub applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordOutcomeResponse {
    pub session: SessionResponse,
    pub context_version: u64,
}

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

/// Error body. `message` is always a fixed, user-safe sentence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub fallback: UserFallback,
    pub retriable: bool,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed.to_string(),
            message: message.into(),
            fallback: UserFallback::TryAgain,
            retriable: false,
        }
    }

    pub fn from_engine(error: &EngineError) -> Self {
        let fallback = error.user_fallback();
        Self {
            code: error.code().to_string(),
            message: safe_message(error.code(), fallback).to_string(),
            fallback,
            retriable: error.is_retriable(),
        }
    }
}

fn safe_message(code: ErrorCode, fallback: UserFallback) -> &'static str {
    match (code, fallback) {
        (ErrorCode::SafetyPlanMissing, _) => {
            "Please create your safety plan before starting a session."
        }
        (ErrorCode::SafetyPlanIncomplete, _) => {
            "Your safety plan needs a few more details before starting a session."
        }
        (ErrorCode::SessionNotFound, _) => "This session could not be found.",
        (_, UserFallback::TryAgain) => "Something went wrong saving this step. Please try again.",
        (_, UserFallback::ShowEscalationPath) => {
            "We could not continue this step. Your crisis resources and safety plan are available now."
        }
    }
}
