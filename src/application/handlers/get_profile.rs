//! GetProfileQuery - what the engine knows about a user before a session.

use std::sync::Arc;

use crate::application::EngineError;
use crate::domain::foundation::UserId;
use crate::domain::safety::{SafetyPlan, SafetyPlanStatus};
use crate::domain::user::VersionedContext;
use crate::ports::{SafetyPlanStore, UserContextStore};

#[derive(Debug, Clone)]
pub struct GetProfileQuery {
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub user_id: UserId,
    pub context: Option<VersionedContext>,
    pub safety_plan: Option<SafetyPlan>,
    pub safety_plan_status: SafetyPlanStatus,
}

pub struct GetProfileHandler {
    contexts: Arc<dyn UserContextStore>,
    safety_plans: Arc<dyn SafetyPlanStore>,
}

impl GetProfileHandler {
    pub fn new(contexts: Arc<dyn UserContextStore>, safety_plans: Arc<dyn SafetyPlanStore>) -> Self {
        Self {
            contexts,
            safety_plans,
        }
    }

    pub async fn handle(&self, query: GetProfileQuery) -> Result<Profile, EngineError> {
        let context = self.contexts.load(&query.user_id).await?;
        let safety_plan = self.safety_plans.find_by_user(&query.user_id).await?;
        let safety_plan_status = SafetyPlanStatus::of(safety_plan.as_ref());
        Ok(Profile {
            user_id: query.user_id,
            context,
            safety_plan,
            safety_plan_status,
        })
    }
}
