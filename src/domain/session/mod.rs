//! Session module - the state machine for one guided interaction.
//!
//! - `aggregate` - [`Session`] with prepare/commit transitions
//! - `transition` - transition kinds and trail entries
//! - `audit` - records mirrored to the audit recorder
//! - `replay` - deterministic re-run of a committed trail

mod aggregate;
mod audit;
mod errors;
mod replay;
mod transition;

pub use aggregate::{PreparedTransition, ReportedOutcome, Session};
pub use audit::{committed_records, AuditEvent, AuditRecord};
pub use errors::SessionError;
pub use replay::{replay, Divergence, ReplayError, ReplayReport};
pub use transition::{Evidence, TrailEntry, Transition, TransitionKind};
