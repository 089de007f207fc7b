//! HTTP adapter for user profile endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    PreferencesResponse, ProfileResponse, SafetyPlanCheck, SaveSafetyPlanRequest,
    SaveSafetyPlanResponse, UpdatePreferencesRequest, UpdatePreferencesResponse,
};
pub use routes::profile_routes;
