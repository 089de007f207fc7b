//! Profile-side adapters: user context and safety plan stores.

mod filesystem;
mod in_memory;

pub use filesystem::FsProfileStore;
pub use in_memory::{InMemorySafetyPlanStore, InMemoryUserContextStore};
