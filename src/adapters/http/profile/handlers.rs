//! HTTP handlers for profile endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::session::{handle_engine_error, ErrorResponse};
use crate::application::handlers::{GetProfileQuery, SaveSafetyPlanCommand, UpdatePreferencesCommand};
use crate::application::Engine;
use crate::domain::foundation::UserId;

use super::dto::{
    PreferencesResponse, ProfileResponse, SaveSafetyPlanRequest, SaveSafetyPlanResponse,
    UpdatePreferencesRequest, UpdatePreferencesResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET /users/:user_id - Preferences, counters and safety plan
pub async fn get_profile(State(engine): State<Engine>, Path(user_id): Path<String>) -> Response {
    let Ok(user_id) = UserId::new(user_id) else {
        return bad_request("Invalid user ID");
    };

    match engine.get_profile.handle(GetProfileQuery { user_id }).await {
        Ok(profile) => (StatusCode::OK, Json(ProfileResponse::from(profile))).into_response(),
        Err(e) => handle_engine_error(e),
    }
}

/// PUT /users/:user_id/preferences - Replace user-set preferences
pub async fn update_preferences(
    State(engine): State<Engine>,
    Path(user_id): Path<String>,
    Json(req): Json<UpdatePreferencesRequest>,
) -> Response {
    let Ok(user_id) = UserId::new(user_id) else {
        return bad_request("Invalid user ID");
    };

    let cmd = UpdatePreferencesCommand {
        user_id: user_id.clone(),
        accessibility: req.accessibility.clone(),
        modality: req.modality,
        duration: req.duration,
    };
    match engine.update_preferences.handle(cmd).await {
        Ok(version) => {
            let response = UpdatePreferencesResponse {
                user_id: user_id.to_string(),
                preferences: PreferencesResponse {
                    accessibility: req.accessibility,
                    modality: req.modality,
                    duration: req.duration,
                },
                context_version: version.as_u64(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_engine_error(e),
    }
}

/// PUT /users/:user_id/safety-plan - Author or replace the safety plan
pub async fn save_safety_plan(
    State(engine): State<Engine>,
    Path(user_id): Path<String>,
    Json(req): Json<SaveSafetyPlanRequest>,
) -> Response {
    let Ok(user_id) = UserId::new(user_id) else {
        return bad_request("Invalid user ID");
    };

    let cmd = SaveSafetyPlanCommand {
        user_id,
        warning_signs: req.warning_signs,
        coping_strategies: req.coping_strategies,
        support_contacts: req.support_contacts,
    };
    match engine.save_safety_plan.handle(cmd).await {
        Ok(result) => (StatusCode::OK, Json(SaveSafetyPlanResponse::from(result))).into_response(),
        Err(e) => handle_engine_error(e),
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::bad_request(message))).into_response()
}
