//! HTTP adapter for session endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    AbortSessionRequest, AbortSessionResponse, ErrorResponse, RecordOutcomeRequest,
    RecordOutcomeResponse, SessionResponse, StartSessionRequest, StartSessionResponse,
    StepOutcomeResponse, SubmitInputRequest, SubmitInputResponse, TrailEntryResponse,
};
pub(crate) use handlers::handle_engine_error;
pub use routes::session_routes;
