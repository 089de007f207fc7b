//! Read-modify-write of a user's context under compare-and-swap.

use std::sync::Arc;

use super::EngineError;
use crate::domain::foundation::UserId;
use crate::domain::user::{ContextVersion, UserContext};
use crate::ports::{CasOutcome, UserContextStore};

pub struct ContextUpdater {
    store: Arc<dyn UserContextStore>,
    max_retries: u32,
}

impl ContextUpdater {
    pub fn new(store: Arc<dyn UserContextStore>, max_retries: u32) -> Self {
        Self { store, max_retries }
    }

    /// Applies `mutate` to the freshest stored context and writes it back.
    ///
    /// On a version conflict the context is reloaded and `mutate` runs
    /// again, at most `max_retries` extra times.
    pub async fn update<F>(&self, user_id: &UserId, mutate: F) -> Result<ContextVersion, EngineError>
    where
        F: Fn(&mut UserContext) + Send + Sync,
    {
        let attempts = self.max_retries + 1;
        for attempt in 1..=attempts {
            let (mut context, expected) = match self.store.load(user_id).await? {
                Some(current) => (current.context, Some(current.version)),
                None => (UserContext::new(user_id.clone()), None),
            };
            mutate(&mut context);

            match self.store.compare_and_swap(user_id, expected, &context).await? {
                CasOutcome::Swapped(version) => return Ok(version),
                CasOutcome::Conflict { current } => {
                    tracing::debug!(
                        user_id = %user_id,
                        attempt,
                        expected = ?expected.map(|v| v.as_u64()),
                        current = ?current.map(|v| v.as_u64()),
                        "user context write conflicted; retrying"
                    );
                }
            }
        }

        tracing::warn!(user_id = %user_id, attempts, "user context update gave up");
        Err(EngineError::ContextConflict { attempts })
    }
}
