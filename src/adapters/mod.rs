//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the engine to external systems:
//! - `audit` - audit recorders (in-memory, JSON lines file)
//! - `catalog` - tree catalog loaders (built-in, YAML directory)
//! - `profile` - user context and safety plan stores (in-memory, filesystem)
//! - `http` - axum JSON API over the application handlers

pub mod audit;
pub mod catalog;
pub mod http;
pub mod profile;

pub use audit::{InMemoryAuditRecorder, JsonlAuditRecorder};
pub use catalog::{BuiltinCatalogLoader, YamlCatalogLoader};
pub use profile::{FsProfileStore, InMemorySafetyPlanStore, InMemoryUserContextStore};
