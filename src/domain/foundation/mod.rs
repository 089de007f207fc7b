//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the decision engine.

mod errors;
mod ids;
mod session_state;
mod state_machine;
mod timestamp;

pub use errors::{ErrorCode, ValidationError};
pub use ids::{
    AuditRecordId, CoachingRef, NodeId, SessionId, SkillId, TreeVersion, UserId, VariantId,
};
pub use session_state::SessionState;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
