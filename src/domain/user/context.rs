//! UserContext - the mutable, versioned personalization record for a user.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::foundation::{SkillId, Timestamp, UserId, ValidationError, VariantId};

/// Intensity at or above which the crisis gate always escalates.
pub const ESCALATION_THRESHOLD: u8 = 8;

/// Version counter for optimistic concurrency on the context record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextVersion(u64);

impl ContextVersion {
    /// Create initial version (1)
    pub fn initial() -> Self {
        Self(1)
    }

    pub fn from_u64(value: u64) -> Result<Self, ValidationError> {
        if value == 0 {
            Err(ValidationError::out_of_range("context_version", 1, i64::MAX, 0))
        } else {
            Ok(Self(value))
        }
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ContextVersion {
    fn default() -> Self {
        Self::initial()
    }
}

impl std::fmt::Display for ContextVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Preferred way of practising a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Modality {
    Movement,
    Stillness,
}

/// Coarse time box for a skill practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DurationBucket {
    Brief,
    Standard,
    Extended,
}

/// Accessibility constraints that rule out some skill variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessibilityNeed {
    LimitedMobility,
    CardiacCondition,
    SensorySensitivity,
}

/// Success/failure tally for a skill or variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub successes: u32,
    pub failures: u32,
}

impl OutcomeCounts {
    pub fn total(&self) -> u32 {
        self.successes + self.failures
    }

    /// Laplace-smoothed success rate; 0.5 with no data.
    pub fn success_rate(&self) -> f64 {
        (f64::from(self.successes) + 1.0) / (f64::from(self.total()) + 2.0)
    }

    fn record(&mut self, helped: bool) {
        if helped {
            self.successes = self.successes.saturating_add(1);
        } else {
            self.failures = self.failures.saturating_add(1);
        }
    }
}

/// Personalization and safety context for one user.
///
/// Read as a snapshot at session start. Written only when a session
/// terminates (or its outcome is recorded), through a versioned
/// compare-and-swap in the context store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    user_id: UserId,
    #[serde(default)]
    accessibility: BTreeSet<AccessibilityNeed>,
    #[serde(default)]
    modality_preference: Option<Modality>,
    #[serde(default)]
    duration_preference: Option<DurationBucket>,
    #[serde(default)]
    skill_history: BTreeMap<SkillId, OutcomeCounts>,
    #[serde(default)]
    variant_history: BTreeMap<VariantId, OutcomeCounts>,
    #[serde(default)]
    recommendations_received: u32,
    #[serde(default)]
    escalations: u32,
    #[serde(default)]
    last_escalated_at: Option<Timestamp>,
    /// Clinician-set threshold; may only be lower than the default.
    #[serde(default)]
    escalation_threshold: Option<u8>,
}

impl UserContext {
    /// Creates an empty context for a user with no history.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            accessibility: BTreeSet::new(),
            modality_preference: None,
            duration_preference: None,
            skill_history: BTreeMap::new(),
            variant_history: BTreeMap::new(),
            recommendations_received: 0,
            escalations: 0,
            last_escalated_at: None,
            escalation_threshold: None,
        }
    }

    pub fn with_accessibility(mut self, need: AccessibilityNeed) -> Self {
        self.accessibility.insert(need);
        self
    }

    pub fn with_modality(mut self, modality: Modality) -> Self {
        self.modality_preference = Some(modality);
        self
    }

    pub fn with_duration(mut self, duration: DurationBucket) -> Self {
        self.duration_preference = Some(duration);
        self
    }

    pub fn with_skill_history(mut self, skill: SkillId, counts: OutcomeCounts) -> Self {
        self.skill_history.insert(skill, counts);
        self
    }

    pub fn with_variant_history(mut self, variant: VariantId, counts: OutcomeCounts) -> Self {
        self.variant_history.insert(variant, counts);
        self
    }

    /// Sets a clinician threshold.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` unless `1 <= threshold <= ESCALATION_THRESHOLD`
    pub fn with_escalation_threshold(mut self, threshold: u8) -> Result<Self, ValidationError> {
        if threshold == 0 || threshold > ESCALATION_THRESHOLD {
            return Err(ValidationError::out_of_range(
                "escalation_threshold",
                1,
                i64::from(ESCALATION_THRESHOLD),
                i64::from(threshold),
            ));
        }
        self.escalation_threshold = Some(threshold);
        Ok(self)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn accessibility(&self) -> &BTreeSet<AccessibilityNeed> {
        &self.accessibility
    }

    pub fn modality_preference(&self) -> Option<Modality> {
        self.modality_preference
    }

    pub fn duration_preference(&self) -> Option<DurationBucket> {
        self.duration_preference
    }

    pub fn skill_outcomes(&self, skill: &SkillId) -> Option<&OutcomeCounts> {
        self.skill_history.get(skill)
    }

    pub fn variant_outcomes(&self, variant: &VariantId) -> Option<&OutcomeCounts> {
        self.variant_history.get(variant)
    }

    pub fn recommendations_received(&self) -> u32 {
        self.recommendations_received
    }

    pub fn escalations(&self) -> u32 {
        self.escalations
    }

    pub fn last_escalated_at(&self) -> Option<&Timestamp> {
        self.last_escalated_at.as_ref()
    }

    /// Threshold the crisis gate applies. Never above [`ESCALATION_THRESHOLD`],
    /// whatever the stored value.
    pub fn effective_escalation_threshold(&self) -> u8 {
        match self.escalation_threshold {
            Some(t) if t >= 1 => t.min(ESCALATION_THRESHOLD),
            _ => ESCALATION_THRESHOLD,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User-set preferences
    // ─────────────────────────────────────────────────────────────────────────

    /// Replaces everything the user sets for themselves. History and the
    /// clinician threshold are untouched.
    pub fn set_preferences(
        &mut self,
        accessibility: BTreeSet<AccessibilityNeed>,
        modality: Option<Modality>,
        duration: Option<DurationBucket>,
    ) {
        self.accessibility = accessibility;
        self.modality_preference = modality;
        self.duration_preference = duration;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Termination updates
    // ─────────────────────────────────────────────────────────────────────────

    /// A session completed with a recommendation.
    pub fn record_recommendation(&mut self) {
        self.recommendations_received = self.recommendations_received.saturating_add(1);
    }

    /// A session ended in escalation.
    pub fn record_escalation(&mut self, at: Timestamp) {
        self.escalations = self.escalations.saturating_add(1);
        self.last_escalated_at = Some(at);
    }

    /// The user reported whether a recommended skill helped.
    pub fn record_outcome(&mut self, skill: &SkillId, variant: Option<&VariantId>, helped: bool) {
        self.skill_history.entry(skill.clone()).or_default().record(helped);
        if let Some(variant) = variant {
            self.variant_history
                .entry(variant.clone())
                .or_default()
                .record(helped);
        }
    }
}

/// A context together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedContext {
    pub context: UserContext,
    pub version: ContextVersion,
}

impl VersionedContext {
    pub fn new(context: UserContext, version: ContextVersion) -> Self {
        Self { context, version }
    }
}
