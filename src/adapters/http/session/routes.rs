//! HTTP routes for session endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    abort_session, get_session, record_outcome, replay_session, start_session, submit_input,
};
use crate::application::Engine;

/// Creates the session router with all endpoints.
pub fn session_routes(engine: Engine) -> Router {
    Router::new()
        .route("/", post(start_session))
        .route("/:id", get(get_session))
        .route("/:id/inputs", post(submit_input))
        .route("/:id/abort", post(abort_session))
        .route("/:id/outcome", post(record_outcome))
        .route("/:id/replay", get(replay_session))
        .with_state(engine)
}
