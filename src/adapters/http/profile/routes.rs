//! HTTP routes for profile endpoints.

use axum::{
    routing::{get, put},
    Router,
};

use super::handlers::{get_profile, save_safety_plan, update_preferences};
use crate::application::Engine;

/// Creates the profile router, keyed by user id.
pub fn profile_routes(engine: Engine) -> Router {
    Router::new()
        .route("/:user_id", get(get_profile))
        .route("/:user_id/preferences", put(update_preferences))
        .route("/:user_id/safety-plan", put(save_safety_plan))
        .with_state(engine)
}
