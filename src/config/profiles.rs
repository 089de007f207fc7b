//! User context and safety plan storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProfileBackend {
    #[default]
    Memory,
    /// YAML files under `directory`
    Filesystem,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilesConfig {
    #[serde(default)]
    pub backend: ProfileBackend,

    /// Required when `backend = filesystem`
    pub directory: Option<PathBuf>,
}

impl ProfilesConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == ProfileBackend::Filesystem && self.directory.is_none() {
            return Err(ValidationError::MissingRequired("profiles.directory"));
        }
        Ok(())
    }
}
