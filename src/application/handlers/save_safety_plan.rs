//! SaveSafetyPlanHandler - author or replace the user's safety plan.

use std::sync::Arc;

use crate::application::EngineError;
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::safety::{SafetyPlan, SafetyPlanStatus, SupportContact};
use crate::ports::SafetyPlanStore;

#[derive(Debug, Clone)]
pub struct SaveSafetyPlanCommand {
    pub user_id: UserId,
    pub warning_signs: Vec<String>,
    pub coping_strategies: Vec<String>,
    pub support_contacts: Vec<SupportContact>,
}

#[derive(Debug, Clone)]
pub struct SaveSafetyPlanResult {
    pub plan: SafetyPlan,
    pub status: SafetyPlanStatus,
}

pub struct SaveSafetyPlanHandler {
    safety_plans: Arc<dyn SafetyPlanStore>,
}

impl SaveSafetyPlanHandler {
    pub fn new(safety_plans: Arc<dyn SafetyPlanStore>) -> Self {
        Self { safety_plans }
    }

    /// Stores the plan even when it is incomplete, so a user can draft it
    /// over several visits. The returned status says whether sessions can
    /// start yet.
    pub async fn handle(&self, cmd: SaveSafetyPlanCommand) -> Result<SaveSafetyPlanResult, EngineError> {
        let plan = SafetyPlan {
            user_id: cmd.user_id,
            warning_signs: cmd.warning_signs,
            coping_strategies: cmd.coping_strategies,
            support_contacts: cmd.support_contacts,
            updated_at: Timestamp::now(),
        };
        self.safety_plans.save(&plan).await?;

        let status = SafetyPlanStatus::of(Some(&plan));
        tracing::info!(
            user_id = %plan.user_id,
            valid = status.is_valid(),
            "safety plan saved"
        );
        Ok(SaveSafetyPlanResult { plan, status })
    }
}
