//! HTTP handlers for session endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::handlers::{
    AbortSessionCommand, GetSessionQuery, RecordOutcomeCommand, ReplaySessionQuery,
    StartSessionCommand, SubmitInputCommand,
};
use crate::application::{Engine, EngineError};
use crate::domain::foundation::{NodeId, SessionId, TreeVersion, UserId};
use crate::domain::session::SessionError;
use crate::ports::{LoaderError, StoreError};

use super::dto::{
    AbortSessionRequest, AbortSessionResponse, ErrorResponse, RecordOutcomeRequest,
    RecordOutcomeResponse, SessionResponse, StartSessionRequest, StartSessionResponse,
    SubmitInputRequest, SubmitInputResponse,
};

const DEFAULT_ABORT_REASON: &str = "aborted by host";

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /sessions - Start a session at the tree root
pub async fn start_session(
    State(engine): State<Engine>,
    Json(req): Json<StartSessionRequest>,
) -> Response {
    let user_id = match UserId::new(req.user_id) {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid user ID"),
    };
    let tree_version = match req.tree_version.map(TreeVersion::new).transpose() {
        Ok(v) => v,
        Err(_) => return bad_request("Invalid tree version"),
    };

    let cmd = StartSessionCommand {
        user_id,
        tree_version,
    };
    match engine.start_session.handle(cmd).await {
        Ok(result) => {
            let response = StartSessionResponse {
                session: SessionResponse::from(&result.session),
                prompt: result.prompt,
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => handle_engine_error(e),
    }
}

/// GET /sessions/:id - Session view
pub async fn get_session(State(engine): State<Engine>, Path(session_id): Path<String>) -> Response {
    let Some(session_id) = parse_session_id(&session_id) else {
        return bad_request("Invalid session ID");
    };

    match engine.get_session.handle(GetSessionQuery { session_id }).await {
        Ok(session) => (StatusCode::OK, Json(SessionResponse::from(&session))).into_response(),
        Err(e) => handle_engine_error(e),
    }
}

/// POST /sessions/:id/inputs - Submit one round of input
pub async fn submit_input(
    State(engine): State<Engine>,
    Path(session_id): Path<String>,
    Json(req): Json<SubmitInputRequest>,
) -> Response {
    let Some(session_id) = parse_session_id(&session_id) else {
        return bad_request("Invalid session ID");
    };
    let expected_node = match req.expected_node.map(NodeId::new).transpose() {
        Ok(node) => node,
        Err(_) => return bad_request("Invalid expected node"),
    };

    let cmd = SubmitInputCommand {
        session_id,
        input: req.input,
        expected_node,
    };
    match engine.submit_input.handle(cmd).await {
        Ok(result) => {
            let response = SubmitInputResponse {
                session: SessionResponse::from(&result.session),
                outcome: result.outcome.into(),
                transitions: result.transitions,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_engine_error(e),
    }
}

/// POST /sessions/:id/abort - Cancel from the hosting layer
pub async fn abort_session(
    State(engine): State<Engine>,
    Path(session_id): Path<String>,
    body: Option<Json<AbortSessionRequest>>,
) -> Response {
    let Some(session_id) = parse_session_id(&session_id) else {
        return bad_request("Invalid session ID");
    };
    let reason = body
        .and_then(|Json(req)| req.reason)
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ABORT_REASON.to_string());

    match engine
        .abort_session
        .handle(AbortSessionCommand { session_id, reason })
        .await
    {
        Ok(result) => {
            let response = AbortSessionResponse {
                session: SessionResponse::from(&result.session),
                applied: result.applied,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_engine_error(e),
    }
}

/// POST /sessions/:id/outcome - Report whether the skill helped
pub async fn record_outcome(
    State(engine): State<Engine>,
    Path(session_id): Path<String>,
    Json(req): Json<RecordOutcomeRequest>,
) -> Response {
    let Some(session_id) = parse_session_id(&session_id) else {
        return bad_request("Invalid session ID");
    };

    let cmd = RecordOutcomeCommand {
        session_id,
        helped: req.helped,
    };
    match engine.record_outcome.handle(cmd).await {
        Ok(result) => {
            let response = RecordOutcomeResponse {
                session: SessionResponse::from(&result.session),
                context_version: result.context_version.as_u64(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_engine_error(e),
    }
}

/// GET /sessions/:id/replay - Audit replay report
pub async fn replay_session(
    State(engine): State<Engine>,
    Path(session_id): Path<String>,
) -> Response {
    let Some(session_id) = parse_session_id(&session_id) else {
        return bad_request("Invalid session ID");
    };

    match engine
        .replay_session
        .handle(ReplaySessionQuery { session_id })
        .await
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => handle_engine_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn parse_session_id(raw: &str) -> Option<SessionId> {
    raw.parse::<SessionId>().ok()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::bad_request(message))).into_response()
}

pub(crate) fn status_for(error: &EngineError) -> StatusCode {
    match error {
        EngineError::Store(StoreError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
        EngineError::SessionNotFound(_)
        | EngineError::TreeVersionNotLoaded(_)
        | EngineError::Loader(LoaderError::NotFound(_)) => StatusCode::NOT_FOUND,
        EngineError::Precondition(_) => StatusCode::PRECONDITION_FAILED,
        EngineError::StaleStep { .. }
        | EngineError::ContextConflict { .. }
        | EngineError::Session(SessionError::OutcomeAlreadyRecorded)
        | EngineError::Session(SessionError::NotCompleted(_))
        | EngineError::Session(SessionError::InvariantViolation { .. }) => StatusCode::CONFLICT,
        EngineError::Recorder(_)
        | EngineError::Store(StoreError::Unavailable(_))
        | EngineError::NoActiveVersion => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn handle_engine_error(error: EngineError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!(code = %error.code(), error = %error, "request failed");
    } else {
        tracing::debug!(code = %error.code(), error = %error, "request rejected");
    }
    (status, Json(ErrorResponse::from_engine(&error))).into_response()
}
