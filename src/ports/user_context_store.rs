//! UserContextStore port - versioned personalization context per user.
//!
//! Reads are snapshots. Writes are compare-and-swap on [`ContextVersion`]
//! and happen only when a session terminates or reports an outcome.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{ErrorCode, UserId};
use crate::domain::user::{ContextVersion, UserContext, VersionedContext};

/// Failure talking to a profile-side store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),

    #[error("User id cannot be used as a storage key: {0}")]
    InvalidKey(UserId),
}

impl StoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::InvalidKey(_) => ErrorCode::ValidationFailed,
            StoreError::Unavailable(_) | StoreError::Corrupt(_) => ErrorCode::StorageError,
        }
    }
}

/// Result of a compare-and-swap write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// Written; the record now carries this version.
    Swapped(ContextVersion),
    /// Someone else wrote first. Reload and retry.
    Conflict { current: Option<ContextVersion> },
}

#[async_trait]
pub trait UserContextStore: Send + Sync {
    /// Load the current context and its version, if one exists.
    async fn load(&self, user_id: &UserId) -> Result<Option<VersionedContext>, StoreError>;

    /// Replace the context iff its version still equals `expected`.
    ///
    /// `expected = None` means "create; no record may exist yet".
    async fn compare_and_swap(
        &self,
        user_id: &UserId,
        expected: Option<ContextVersion>,
        context: &UserContext,
    ) -> Result<CasOutcome, StoreError>;
}
