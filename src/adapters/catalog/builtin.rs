//! Built-in catalog.

use async_trait::async_trait;

use super::parse_definition;
use crate::domain::foundation::TreeVersion;
use crate::domain::tree::TreeDefinition;
use crate::ports::{LoaderError, TreeCatalogLoader};

/// Version id of the embedded catalog.
pub const BUILTIN_VERSION: &str = "dbt-v1";

const DBT_V1: &str = include_str!("dbt-v1.yaml");

/// Serves the embedded `dbt-v1` tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalogLoader;

impl BuiltinCatalogLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TreeCatalogLoader for BuiltinCatalogLoader {
    async fn load(&self, version: &TreeVersion) -> Result<TreeDefinition, LoaderError> {
        if version.as_str() != BUILTIN_VERSION {
            return Err(LoaderError::NotFound(version.clone()));
        }
        parse_definition(version, DBT_V1)
    }

    async fn available_versions(&self) -> Result<Vec<TreeVersion>, LoaderError> {
        TreeVersion::new(BUILTIN_VERSION)
            .map(|v| vec![v])
            .map_err(|e| LoaderError::Io(e.to_string()))
    }
}
