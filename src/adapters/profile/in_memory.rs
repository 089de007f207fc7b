//! In-memory profile stores for tests and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::domain::safety::SafetyPlan;
use crate::domain::user::{ContextVersion, UserContext, VersionedContext};
use crate::ports::{CasOutcome, SafetyPlanStore, StoreError, UserContextStore};

/// In-memory [`UserContextStore`] with CAS semantics.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserContextStore {
    contexts: Arc<RwLock<HashMap<UserId, VersionedContext>>>,
    forced_conflicts: Arc<AtomicU32>,
}

impl InMemoryUserContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds or overwrites a context at its next version.
    pub async fn put(&self, context: UserContext) -> ContextVersion {
        let mut contexts = self.contexts.write().await;
        let version = contexts
            .get(context.user_id())
            .map(|v| v.version.next())
            .unwrap_or_else(ContextVersion::initial);
        contexts.insert(
            context.user_id().clone(),
            VersionedContext::new(context, version),
        );
        version
    }

    /// The next `count` swaps report a conflict, as if another writer won.
    pub fn force_conflicts(&self, count: u32) {
        self.forced_conflicts.store(count, Ordering::SeqCst);
    }

    pub async fn get(&self, user_id: &UserId) -> Option<VersionedContext> {
        self.contexts.read().await.get(user_id).cloned()
    }
}

#[async_trait]
impl UserContextStore for InMemoryUserContextStore {
    async fn load(&self, user_id: &UserId) -> Result<Option<VersionedContext>, StoreError> {
        Ok(self.contexts.read().await.get(user_id).cloned())
    }

    async fn compare_and_swap(
        &self,
        user_id: &UserId,
        expected: Option<ContextVersion>,
        context: &UserContext,
    ) -> Result<CasOutcome, StoreError> {
        let mut contexts = self.contexts.write().await;
        let current = contexts.get(user_id).map(|v| v.version);

        let forced = self
            .forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced || current != expected {
            return Ok(CasOutcome::Conflict { current });
        }

        let next = current.map_or_else(ContextVersion::initial, |v| v.next());
        contexts.insert(user_id.clone(), VersionedContext::new(context.clone(), next));
        Ok(CasOutcome::Swapped(next))
    }
}

/// In-memory [`SafetyPlanStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemorySafetyPlanStore {
    plans: Arc<RwLock<HashMap<UserId, SafetyPlan>>>,
}

impl InMemorySafetyPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, plan: SafetyPlan) {
        self.plans.write().await.insert(plan.user_id.clone(), plan);
    }

    pub async fn remove(&self, user_id: &UserId) {
        self.plans.write().await.remove(user_id);
    }
}

#[async_trait]
impl SafetyPlanStore for InMemorySafetyPlanStore {
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<SafetyPlan>, StoreError> {
        Ok(self.plans.read().await.get(user_id).cloned())
    }

    async fn save(&self, plan: &SafetyPlan) -> Result<(), StoreError> {
        self.put(plan.clone()).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[tokio::test]
    async fn create_then_swap() {
        let store = InMemoryUserContextStore::new();
        let ctx = UserContext::new(user());

        assert_eq!(
            store.compare_and_swap(&user(), None, &ctx).await.unwrap(),
            CasOutcome::Swapped(ContextVersion::initial())
        );
        let loaded = store.load(&user()).await.unwrap().unwrap();
        assert_eq!(loaded.version.as_u64(), 1);

        let outcome = store
            .compare_and_swap(&user(), Some(loaded.version), &loaded.context)
            .await
            .unwrap();
        assert_eq!(outcome, CasOutcome::Swapped(loaded.version.next()));
    }

    #[tokio::test]
    async fn stale_version_conflicts() {
        let store = InMemoryUserContextStore::new();
        let v1 = store.put(UserContext::new(user())).await;
        store.put(UserContext::new(user())).await;

        let outcome = store
            .compare_and_swap(&user(), Some(v1), &UserContext::new(user()))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CasOutcome::Conflict {
                current: Some(v1.next())
            }
        );
    }

    #[tokio::test]
    async fn create_conflicts_if_record_exists() {
        let store = InMemoryUserContextStore::new();
        store.put(UserContext::new(user())).await;
        assert!(matches!(
            store
                .compare_and_swap(&user(), None, &UserContext::new(user()))
                .await
                .unwrap(),
            CasOutcome::Conflict { .. }
        ));
    }

    #[tokio::test]
    async fn forced_conflicts_are_consumed() {
        let store = InMemoryUserContextStore::new();
        store.force_conflicts(1);
        let ctx = UserContext::new(user());
        assert!(matches!(
            store.compare_and_swap(&user(), None, &ctx).await.unwrap(),
            CasOutcome::Conflict { current: None }
        ));
        assert!(matches!(
            store.compare_and_swap(&user(), None, &ctx).await.unwrap(),
            CasOutcome::Swapped(_)
        ));
    }

    #[tokio::test]
    async fn safety_plan_lookup() {
        let store = InMemorySafetyPlanStore::new();
        assert!(store.find_by_user(&user()).await.unwrap().is_none());
        store.put(SafetyPlan::new(user())).await;
        assert!(store.find_by_user(&user()).await.unwrap().is_some());
    }
}
