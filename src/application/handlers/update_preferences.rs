//! UpdatePreferencesHandler - the user's own personalization settings.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::application::{ContextUpdater, EngineError};
use crate::domain::foundation::UserId;
use crate::domain::user::{AccessibilityNeed, ContextVersion, DurationBucket, Modality};

/// Full replacement of the user-set fields. The clinician escalation
/// threshold is not settable here.
#[derive(Debug, Clone)]
pub struct UpdatePreferencesCommand {
    pub user_id: UserId,
    pub accessibility: BTreeSet<AccessibilityNeed>,
    pub modality: Option<Modality>,
    pub duration: Option<DurationBucket>,
}

pub struct UpdatePreferencesHandler {
    context_updater: Arc<ContextUpdater>,
}

impl UpdatePreferencesHandler {
    pub fn new(context_updater: Arc<ContextUpdater>) -> Self {
        Self { context_updater }
    }

    /// Writes through the same compare-and-swap as session terminations,
    /// so concurrent history updates are never lost. Creates the context
    /// if the user has none yet.
    pub async fn handle(&self, cmd: UpdatePreferencesCommand) -> Result<ContextVersion, EngineError> {
        let version = self
            .context_updater
            .update(&cmd.user_id, |c| {
                c.set_preferences(cmd.accessibility.clone(), cmd.modality, cmd.duration)
            })
            .await?;

        tracing::info!(
            user_id = %cmd.user_id,
            accessibility = cmd.accessibility.len(),
            version = version.as_u64(),
            "preferences updated"
        );
        Ok(version)
    }
}
