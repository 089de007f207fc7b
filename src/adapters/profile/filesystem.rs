//! Filesystem profile store.
//!
//! Layout: `{base_dir}/profiles/{user_id}/context.yaml` and
//! `{base_dir}/profiles/{user_id}/safety_plan.yaml`. Context writes go to a
//! temporary file and are renamed into place; CAS is serialized in-process.
//! User ids that are not plain path components are rejected with
//! [`StoreError::InvalidKey`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::foundation::UserId;
use crate::domain::safety::SafetyPlan;
use crate::domain::user::{ContextVersion, UserContext, VersionedContext};
use crate::ports::{CasOutcome, SafetyPlanStore, StoreError, UserContextStore};

pub struct FsProfileStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FsProfileStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn user_dir(&self, user_id: &UserId) -> Result<PathBuf, StoreError> {
        let id = user_id.as_str();
        let plain = id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | '+'))
            && !id.starts_with('.');
        if !plain {
            tracing::warn!("rejected user id that is not a plain path component");
            return Err(StoreError::InvalidKey(user_id.clone()));
        }
        Ok(self.base_dir.join("profiles").join(id))
    }

    fn context_path(&self, user_id: &UserId) -> Result<PathBuf, StoreError> {
        Ok(self.user_dir(user_id)?.join("context.yaml"))
    }

    fn safety_plan_path(&self, user_id: &UserId) -> Result<PathBuf, StoreError> {
        Ok(self.user_dir(user_id)?.join("safety_plan.yaml"))
    }

    async fn read_yaml<T: serde::de::DeserializeOwned>(
        path: &Path,
    ) -> Result<Option<T>, StoreError> {
        match fs::read_to_string(path).await {
            Ok(yaml) => serde_yaml::from_str(&yaml)
                .map(Some)
                .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Unavailable(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn write_yaml<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Unavailable(format!("Failed to create directory: {}", e)))?;
        }
        let yaml = serde_yaml::to_string(value)
            .map_err(|e| StoreError::Corrupt(format!("Failed to encode: {}", e)))?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, yaml)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to write temporary file: {}", e)))?;
        fs::rename(&temp_path, path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to rename file: {}", e)))
    }
}

#[async_trait]
impl UserContextStore for FsProfileStore {
    async fn load(&self, user_id: &UserId) -> Result<Option<VersionedContext>, StoreError> {
        Self::read_yaml(&self.context_path(user_id)?).await
    }

    async fn compare_and_swap(
        &self,
        user_id: &UserId,
        expected: Option<ContextVersion>,
        context: &UserContext,
    ) -> Result<CasOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.context_path(user_id)?;
        let current: Option<VersionedContext> = Self::read_yaml(&path).await?;
        let current_version = current.map(|c| c.version);
        if current_version != expected {
            return Ok(CasOutcome::Conflict {
                current: current_version,
            });
        }

        let next = current_version.map_or_else(ContextVersion::initial, |v| v.next());
        Self::write_yaml(&path, &VersionedContext::new(context.clone(), next)).await?;
        Ok(CasOutcome::Swapped(next))
    }
}

#[async_trait]
impl SafetyPlanStore for FsProfileStore {
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<SafetyPlan>, StoreError> {
        Self::read_yaml(&self.safety_plan_path(user_id)?).await
    }

    async fn save(&self, plan: &SafetyPlan) -> Result<(), StoreError> {
        Self::write_yaml(&self.safety_plan_path(&plan.user_id)?, plan).await
    }
}
