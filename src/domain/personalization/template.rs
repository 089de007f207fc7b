//! Coaching templates published alongside a tree version.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::foundation::{CoachingRef, SkillId, ValidationError, VariantId};
use crate::domain::user::{AccessibilityNeed, DurationBucket, Modality};

/// Placeholder substituted with the resolved duration in minutes.
pub const MINUTES_PLACEHOLDER: &str = "{minutes}";

/// Minutes per duration bucket for one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationMinutes {
    pub brief: u16,
    pub standard: u16,
    pub extended: u16,
}

impl DurationMinutes {
    pub fn for_bucket(&self, bucket: DurationBucket) -> u16 {
        match bucket {
            DurationBucket::Brief => self.brief,
            DurationBucket::Standard => self.standard,
            DurationBucket::Extended => self.extended,
        }
    }
}

impl Default for DurationMinutes {
    fn default() -> Self {
        Self {
            brief: 2,
            standard: 5,
            extended: 15,
        }
    }
}

/// One presentation of a skill, e.g. paced breathing within TIPP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillVariant {
    pub id: VariantId,
    pub label: String,
    pub modality: Modality,
    pub steps: Vec<String>,
    /// Accessibility needs this variant must not be offered under.
    #[serde(default)]
    pub excluded_for: BTreeSet<AccessibilityNeed>,
}

impl SkillVariant {
    pub fn suits(&self, needs: &BTreeSet<AccessibilityNeed>) -> bool {
        self.excluded_for.is_disjoint(needs)
    }
}

/// Pre-authored coaching content for one skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachingTemplate {
    pub coaching_ref: CoachingRef,
    pub skill_id: SkillId,
    pub family: String,
    pub title: String,
    /// Generic steps used when no personalization axis applies.
    pub steps: Vec<String>,
    #[serde(default = "default_bucket")]
    pub default_duration: DurationBucket,
    #[serde(default)]
    pub minutes: DurationMinutes,
    /// Ordered by published preference.
    #[serde(default)]
    pub variants: Vec<SkillVariant>,
}

fn default_bucket() -> DurationBucket {
    DurationBucket::Standard
}

impl CoachingTemplate {
    /// Checks the template is renderable.
    ///
    /// # Errors
    ///
    /// - `EmptyField` when generic or variant steps are empty
    /// - `InvalidFormat` when variant ids repeat
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.steps.iter().all(|s| s.trim().is_empty()) {
            return Err(ValidationError::empty_field("steps"));
        }
        let mut seen = BTreeSet::new();
        for variant in &self.variants {
            if !seen.insert(&variant.id) {
                return Err(ValidationError::invalid_format(
                    "variants",
                    format!("duplicate variant id {}", variant.id),
                ));
            }
            if variant.steps.iter().all(|s| s.trim().is_empty()) {
                return Err(ValidationError::empty_field(format!(
                    "variants.{}.steps",
                    variant.id
                )));
            }
        }
        Ok(())
    }

    pub fn variant(&self, id: &VariantId) -> Option<&SkillVariant> {
        self.variants.iter().find(|v| &v.id == id)
    }
}
