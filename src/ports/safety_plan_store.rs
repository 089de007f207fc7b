//! SafetyPlanStore port - user-authored safety plans.

use async_trait::async_trait;

use super::StoreError;
use crate::domain::foundation::UserId;
use crate::domain::safety::SafetyPlan;

#[async_trait]
pub trait SafetyPlanStore: Send + Sync {
    /// Find the user's safety plan. `None` if the user has not written one.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<SafetyPlan>, StoreError>;

    /// Saves the plan, replacing any earlier one for the same user.
    /// Incomplete plans are stored as written.
    async fn save(&self, plan: &SafetyPlan) -> Result<(), StoreError>;
}
