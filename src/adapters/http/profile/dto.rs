//! Data Transfer Objects for profile endpoints.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::application::handlers::{Profile, SaveSafetyPlanResult};
use crate::domain::safety::{SafetyPlan, SafetyPlanError, SafetyPlanStatus, SupportContact};
use crate::domain::user::{AccessibilityNeed, DurationBucket, Modality, UserContext};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Replaces all user-set preferences. Omitted fields are cleared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePreferencesRequest {
    #[serde(default)]
    pub accessibility: BTreeSet<AccessibilityNeed>,
    #[serde(default)]
    pub modality: Option<Modality>,
    #[serde(default)]
    pub duration: Option<DurationBucket>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveSafetyPlanRequest {
    #[serde(default)]
    pub warning_signs: Vec<String>,
    #[serde(default)]
    pub coping_strategies: Vec<String>,
    #[serde(default)]
    pub support_contacts: Vec<SupportContact>,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesResponse {
    pub accessibility: BTreeSet<AccessibilityNeed>,
    pub modality: Option<Modality>,
    pub duration: Option<DurationBucket>,
}

impl From<&UserContext> for PreferencesResponse {
    fn from(context: &UserContext) -> Self {
        Self {
            accessibility: context.accessibility().clone(),
            modality: context.modality_preference(),
            duration: context.duration_preference(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePreferencesResponse {
    pub user_id: String,
    pub preferences: PreferencesResponse,
    pub context_version: u64,
}

/// Whether sessions can start, and if not, why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyPlanCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<SafetyPlanError>,
}

impl From<SafetyPlanStatus> for SafetyPlanCheck {
    fn from(status: SafetyPlanStatus) -> Self {
        match status {
            SafetyPlanStatus::Valid => Self {
                valid: true,
                problem: None,
            },
            SafetyPlanStatus::Invalid(problem) => Self {
                valid: false,
                problem: Some(problem),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSafetyPlanResponse {
    pub safety_plan: SafetyPlan,
    pub check: SafetyPlanCheck,
}

impl From<SaveSafetyPlanResult> for SaveSafetyPlanResponse {
    fn from(result: SaveSafetyPlanResult) -> Self {
        Self {
            safety_plan: result.plan,
            check: result.status.into(),
        }
    }
}

/// Profile view. Per-skill history stays internal to personalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<PreferencesResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_version: Option<u64>,
    pub recommendations_received: u32,
    pub escalations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_plan: Option<SafetyPlan>,
    pub safety_plan_check: SafetyPlanCheck,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        let context = profile.context.as_ref().map(|v| &v.context);
        Self {
            user_id: profile.user_id.to_string(),
            preferences: context.map(PreferencesResponse::from),
            context_version: profile.context.as_ref().map(|v| v.version.as_u64()),
            recommendations_received: context.map_or(0, UserContext::recommendations_received),
            escalations: context.map_or(0, UserContext::escalations),
            safety_plan: profile.safety_plan,
            safety_plan_check: profile.safety_plan_status.into(),
        }
    }
}
