//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Namespace for deterministic audit record ids.
const AUDIT_RECORD_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2d3e_9a4b_4c5d_8e7f_10a2_b3c4_d5e6);

/// Unique identifier for one guided-skills session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random SessionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a SessionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Idempotency key for one audit record.
///
/// Derived from the session, the sequence number and a digest of what the
/// record says. Resending the same record yields the same id; a different
/// transition at the same sequence never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditRecordId(Uuid);

impl AuditRecordId {
    /// Deterministic id for the `sequence`-th record of a session with the
    /// given content digest.
    pub fn derive(session_id: &SessionId, sequence: u64, content_digest: &[u8]) -> Self {
        let mut name = session_id.as_uuid().as_bytes().to_vec();
        name.extend_from_slice(&sequence.to_be_bytes());
        name.extend_from_slice(content_digest);
        Self(Uuid::new_v5(&AUDIT_RECORD_NAMESPACE, &name))
    }

    /// Creates an AuditRecordId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AuditRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Defines a non-empty string identifier.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new id, returning error if empty.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::empty_field($field));
                }
                Ok(Self(id))
            }

            /// Returns the inner string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

string_id!(
    /// User identifier (supplied by the profile store).
    UserId,
    "user_id"
);

string_id!(
    /// Identifier of a node within one tree version.
    NodeId,
    "node_id"
);

string_id!(
    /// Identifier of a published tree version, e.g. `dbt-v1`.
    TreeVersion,
    "tree_version"
);

string_id!(
    /// Identifier of a DBT skill, e.g. `tipp`.
    SkillId,
    "skill_id"
);

string_id!(
    /// Reference to a coaching template published with a tree version.
    CoachingRef,
    "coaching_ref"
);

string_id!(
    /// Identifier of a presentation variant within a skill family.
    VariantId,
    "variant_id"
);
