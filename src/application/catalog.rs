//! In-process tree catalog: load → validate → activate.
//!
//! Published trees are immutable and shared as `Arc<DecisionTree>`. A
//! version that fails structural validation is never inserted.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::EngineError;
use crate::domain::foundation::TreeVersion;
use crate::domain::tree::DecisionTree;
use crate::ports::TreeCatalogLoader;

#[derive(Default)]
struct CatalogState {
    trees: HashMap<TreeVersion, Arc<DecisionTree>>,
    active: Option<TreeVersion>,
}

pub struct TreeCatalog {
    loader: Arc<dyn TreeCatalogLoader>,
    state: RwLock<CatalogState>,
}

impl TreeCatalog {
    pub fn new(loader: Arc<dyn TreeCatalogLoader>) -> Self {
        Self {
            loader,
            state: RwLock::new(CatalogState::default()),
        }
    }

    /// Loads and validates a version without changing the active one.
    ///
    /// Reloading an identical version is a no-op. Reloading a version id
    /// with different content is refused.
    pub async fn load(&self, version: &TreeVersion) -> Result<Arc<DecisionTree>, EngineError> {
        let definition = self.loader.load(version).await?;
        let tree = DecisionTree::from_definition(definition).map_err(|e| {
            tracing::error!(version = %version, error = %e, "refusing to load malformed tree");
            e
        })?;

        let mut state = self.state.write().await;
        if let Some(existing) = state.trees.get(version) {
            if existing.fingerprint() != tree.fingerprint() {
                return Err(EngineError::FingerprintConflict(version.clone()));
            }
            return Ok(Arc::clone(existing));
        }

        tracing::info!(
            version = %version,
            nodes = tree.node_count(),
            fingerprint = tree.fingerprint(),
            "tree version loaded"
        );
        let tree = Arc::new(tree);
        state.trees.insert(version.clone(), Arc::clone(&tree));
        Ok(tree)
    }

    pub async fn load_and_activate(
        &self,
        version: &TreeVersion,
    ) -> Result<Arc<DecisionTree>, EngineError> {
        let tree = self.load(version).await?;
        self.set_active(version).await?;
        Ok(tree)
    }

    /// Returns a loaded version, loading it on first use.
    pub async fn get_or_load(
        &self,
        version: &TreeVersion,
    ) -> Result<Arc<DecisionTree>, EngineError> {
        if let Some(tree) = self.get(version).await {
            return Ok(tree);
        }
        self.load(version).await
    }

    pub async fn get(&self, version: &TreeVersion) -> Option<Arc<DecisionTree>> {
        self.state.read().await.trees.get(version).cloned()
    }

    pub async fn active(&self) -> Result<Arc<DecisionTree>, EngineError> {
        let state = self.state.read().await;
        state
            .active
            .as_ref()
            .and_then(|v| state.trees.get(v))
            .cloned()
            .ok_or(EngineError::NoActiveVersion)
    }

    /// Points new sessions at an already-loaded version.
    ///
    /// Running sessions stay bound to the version they started with.
    pub async fn set_active(&self, version: &TreeVersion) -> Result<(), EngineError> {
        let mut state = self.state.write().await;
        if !state.trees.contains_key(version) {
            return Err(EngineError::TreeVersionNotLoaded(version.clone()));
        }
        if state.active.as_ref() != Some(version) {
            tracing::info!(version = %version, "tree version activated");
            state.active = Some(version.clone());
        }
        Ok(())
    }

    pub async fn active_version(&self) -> Option<TreeVersion> {
        self.state.read().await.active.clone()
    }

    /// Versions currently held in memory, sorted.
    pub async fn loaded_versions(&self) -> Vec<TreeVersion> {
        let mut versions: Vec<_> = self.state.read().await.trees.keys().cloned().collect();
        versions.sort();
        versions
    }

    /// Versions the loader can supply.
    pub async fn available_versions(&self) -> Result<Vec<TreeVersion>, EngineError> {
        Ok(self.loader.available_versions().await?)
    }
}
