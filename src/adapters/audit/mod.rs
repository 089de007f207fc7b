//! Audit recorder adapters.

mod in_memory;
mod jsonl;

pub use in_memory::InMemoryAuditRecorder;
pub use jsonl::JsonlAuditRecorder;
