//! User module - personalization and safety context.

mod context;

pub use context::{
    AccessibilityNeed, ContextVersion, DurationBucket, Modality, OutcomeCounts, UserContext,
    VersionedContext, ESCALATION_THRESHOLD,
};
