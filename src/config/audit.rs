//! Audit recorder configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Where audit records go
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuditSink {
    /// Process memory; lost on restart
    #[default]
    Memory,
    /// Append-only JSON lines file
    Jsonl,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub sink: AuditSink,

    /// Required when `sink = jsonl`
    pub jsonl_path: Option<PathBuf>,
}

impl AuditConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sink == AuditSink::Jsonl && self.jsonl_path.is_none() {
            return Err(ValidationError::MissingRequired("audit.jsonl_path"));
        }
        Ok(())
    }
}
