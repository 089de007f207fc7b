//! TreeCatalogLoader port - source of published tree definitions.
//!
//! Loaders only fetch and parse. Structural validation and activation are
//! done by the engine's catalog.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{ErrorCode, TreeVersion};
use crate::domain::tree::TreeDefinition;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    #[error("Tree version {0} not found in catalog")]
    NotFound(TreeVersion),

    #[error("Catalog I/O failed: {0}")]
    Io(String),

    #[error("Catalog entry {version} could not be parsed: {message}")]
    Parse { version: String, message: String },

    #[error("Requested {requested} but catalog entry declares {found}")]
    VersionMismatch {
        requested: TreeVersion,
        found: TreeVersion,
    },
}

impl LoaderError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LoaderError::NotFound(_) => ErrorCode::TreeVersionNotFound,
            LoaderError::Io(_) => ErrorCode::StorageError,
            LoaderError::Parse { .. } | LoaderError::VersionMismatch { .. } => {
                ErrorCode::StructuralError
            }
        }
    }
}

#[async_trait]
pub trait TreeCatalogLoader: Send + Sync {
    /// Fetch one version's definition.
    async fn load(&self, version: &TreeVersion) -> Result<TreeDefinition, LoaderError>;

    /// Versions this loader can supply, sorted.
    async fn available_versions(&self) -> Result<Vec<TreeVersion>, LoaderError>;
}
