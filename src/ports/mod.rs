//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the engine and its external collaborators. Adapters implement these ports.
//!
//! - `AuditRecorder` - append-only, idempotent transition log
//! - `UserContextStore` - versioned personalization context with CAS writes
//! - `SafetyPlanStore` - safety plan lookup for the precondition and gate
//! - `TreeCatalogLoader` - published tree definitions by version

mod audit_recorder;
mod safety_plan_store;
mod tree_catalog_loader;
mod user_context_store;

pub use audit_recorder::{AppendReceipt, AuditRecorder, RecorderError};
pub use safety_plan_store::SafetyPlanStore;
pub use tree_catalog_loader::{LoaderError, TreeCatalogLoader};
pub use user_context_store::{CasOutcome, StoreError, UserContextStore};
