//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `TIDE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use tide_engine::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod audit;
mod catalog;
mod engine;
mod error;
mod profiles;
mod server;

pub use audit::{AuditConfig, AuditSink};
pub use catalog::CatalogConfig;
pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};
pub use profiles::{ProfileBackend, ProfilesConfig};
pub use server::{LogFormat, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// development setup over in-memory adapters and the built-in catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Listener address, request timeout and log output
    #[serde(default)]
    pub server: ServerConfig,

    /// Engine tunables (audit timeout, CAS retries, step limit)
    #[serde(default)]
    pub engine: EngineConfig,

    /// Tree catalog source and active version
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Audit recorder sink
    #[serde(default)]
    pub audit: AuditConfig,

    /// User context and safety plan storage
    #[serde(default)]
    pub profiles: ProfilesConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `TIDE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `TIDE__SERVER__BIND=0.0.0.0:7400` -> `server.bind = "0.0.0.0:7400"`
    /// - `TIDE__ENGINE__AUDIT_TIMEOUT_MS=500` -> `engine.audit_timeout_ms = 500`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().prefix("TIDE").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.engine.validate()?;
        self.catalog.validate()?;
        self.audit.validate()?;
        self.profiles.validate()?;
        Ok(())
    }
}
