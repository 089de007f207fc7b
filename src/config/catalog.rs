//! Tree catalog configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Directory of `{version}.yaml` trees. The built-in catalog is used when unset.
    pub directory: Option<PathBuf>,

    /// Version new sessions bind to
    #[serde(default = "default_active_version")]
    pub active_version: String,
}

impl CatalogConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.active_version.trim().is_empty() {
            return Err(ValidationError::MissingRequired("catalog.active_version"));
        }
        Ok(())
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            directory: None,
            active_version: default_active_version(),
        }
    }
}

fn default_active_version() -> String {
    "dbt-v1".to_string()
}
