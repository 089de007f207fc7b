//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address {0}")]
    InvalidSocketAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Audit timeout must be between 1 and 30000 ms")]
    InvalidAuditTimeout,

    #[error("Context CAS retries must be at most 100")]
    TooManyCasRetries,

    #[error("Auto-advance step limit must be between 1 and 1024")]
    InvalidStepLimit,

    #[error("Session sweep interval must be positive")]
    InvalidSweepInterval,
}
