//! Engine tunables

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::EngineSettings;

/// Engine configuration. The crisis gate has no switch here.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Bound on each audit append, in milliseconds
    #[serde(default = "default_audit_timeout_ms")]
    pub audit_timeout_ms: u64,

    /// Extra attempts after a user context CAS conflict
    #[serde(default = "default_cas_retries")]
    pub context_cas_max_retries: u32,

    /// Steps one input may drive before traversal is considered stuck
    #[serde(default = "default_max_auto_advance_steps")]
    pub max_auto_advance_steps: u32,

    /// How long a finished session stays readable, in seconds. Covers the
    /// window for reporting an outcome and for replay.
    #[serde(default = "default_session_retention_secs")]
    pub session_retention_secs: u64,

    /// Seconds between retention sweeps
    #[serde(default = "default_session_sweep_interval_secs")]
    pub session_sweep_interval_secs: u64,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=30_000).contains(&self.audit_timeout_ms) {
            return Err(ValidationError::InvalidAuditTimeout);
        }
        if self.context_cas_max_retries > 100 {
            return Err(ValidationError::TooManyCasRetries);
        }
        if !(1..=1024).contains(&self.max_auto_advance_steps) {
            return Err(ValidationError::InvalidStepLimit);
        }
        if self.session_sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidSweepInterval);
        }
        Ok(())
    }

    pub fn session_retention(&self) -> Duration {
        Duration::from_secs(self.session_retention_secs)
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_interval_secs)
    }

    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            audit_timeout: Duration::from_millis(self.audit_timeout_ms),
            context_cas_max_retries: self.context_cas_max_retries,
            max_auto_advance_steps: self.max_auto_advance_steps,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            audit_timeout_ms: default_audit_timeout_ms(),
            context_cas_max_retries: default_cas_retries(),
            max_auto_advance_steps: default_max_auto_advance_steps(),
            session_retention_secs: default_session_retention_secs(),
            session_sweep_interval_secs: default_session_sweep_interval_secs(),
        }
    }
}

fn default_audit_timeout_ms() -> u64 {
    2000
}

fn default_cas_retries() -> u32 {
    5
}

fn default_max_auto_advance_steps() -> u32 {
    32
}

fn default_session_retention_secs() -> u64 {
    3600
}

fn default_session_sweep_interval_secs() -> u64 {
    60
}
