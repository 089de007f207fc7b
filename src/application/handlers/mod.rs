//! Application handlers.
//!
//! One command or query handler per engine operation.

mod abort_session;
mod get_profile;
mod get_session;
mod record_outcome;
mod replay_session;
mod save_safety_plan;
mod start_session;
mod submit_input;
mod update_preferences;

pub use abort_session::{AbortSessionCommand, AbortSessionHandler, AbortSessionResult};
pub use get_profile::{GetProfileHandler, GetProfileQuery, Profile};
pub use get_session::{GetSessionHandler, GetSessionQuery};
pub use record_outcome::{RecordOutcomeCommand, RecordOutcomeHandler, RecordOutcomeResult};
pub use replay_session::{ReplaySessionHandler, ReplaySessionQuery};
pub use save_safety_plan::{SaveSafetyPlanCommand, SaveSafetyPlanHandler, SaveSafetyPlanResult};
pub use start_session::{StartSessionCommand, StartSessionHandler, StartSessionResult};
pub use submit_input::{StepOutcome, SubmitInputCommand, SubmitInputHandler, SubmitInputResult};
pub use update_preferences::{UpdatePreferencesCommand, UpdatePreferencesHandler};
