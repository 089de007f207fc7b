//! Personalization Resolver.
//!
//! Runs strictly after the tree reached a terminal node. Adjusts only how a
//! skill is presented: modality variant, duration bucket and accessibility
//! substitution within the same skill family.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::template::{CoachingTemplate, SkillVariant, MINUTES_PLACEHOLDER};
use crate::domain::foundation::{CoachingRef, SkillId, VariantId};
use crate::domain::user::{DurationBucket, Modality, UserContext};

/// The content delivered to the user for a selected skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedRecommendation {
    pub skill_id: SkillId,
    pub coaching_ref: CoachingRef,
    pub family: String,
    pub title: String,
    pub variant_id: Option<VariantId>,
    pub variant_label: Option<String>,
    pub modality: Option<Modality>,
    pub duration: DurationBucket,
    pub minutes: u16,
    pub steps: Vec<String>,
    /// True when the published generic template was used.
    pub generic: bool,
}

/// Renders `coaching_ref` for `skill_id` using the user's context.
///
/// The returned `skill_id` is always the one passed in.
pub fn personalize(
    skill_id: &SkillId,
    template: &CoachingTemplate,
    context: &UserContext,
) -> RenderedRecommendation {
    let duration = context
        .duration_preference()
        .unwrap_or(template.default_duration);
    let minutes = template.minutes.for_bucket(duration);

    let variant = select_variant(template, context);
    let (steps, generic) = match variant {
        Some(v) => (render_steps(&v.steps, minutes), false),
        None => (render_steps(&template.steps, minutes), true),
    };

    tracing::debug!(
        skill = %skill_id,
        variant = variant.map(|v| v.id.as_str()).unwrap_or("generic"),
        ?duration,
        "recommendation personalized"
    );

    RenderedRecommendation {
        skill_id: skill_id.clone(),
        coaching_ref: template.coaching_ref.clone(),
        family: template.family.clone(),
        title: template.title.clone(),
        variant_id: variant.map(|v| v.id.clone()),
        variant_label: variant.map(|v| v.label.clone()),
        modality: variant.map(|v| v.modality),
        duration,
        minutes,
        steps,
        generic,
    }
}

/// Picks a variant, or `None` for the generic template.
///
/// Variants excluded by an accessibility need are never offered. Among the
/// rest, a matching modality wins, then the better smoothed success rate,
/// then declaration order.
fn select_variant<'a>(
    template: &'a CoachingTemplate,
    context: &UserContext,
) -> Option<&'a SkillVariant> {
    if template.variants.is_empty() {
        return None;
    }

    let needs = context.accessibility();
    let candidates: Vec<&SkillVariant> =
        template.variants.iter().filter(|v| v.suits(needs)).collect();
    if candidates.is_empty() {
        return None;
    }

    let accommodated = candidates.len() < template.variants.len();
    let has_history = candidates
        .iter()
        .any(|v| context.variant_outcomes(&v.id).is_some_and(|c| c.total() > 0));
    let preference = context.modality_preference();

    if preference.is_none() && !has_history && !accommodated {
        return None;
    }

    let preferred: Vec<&SkillVariant> = match preference {
        Some(modality) => candidates
            .iter()
            .copied()
            .filter(|v| v.modality == modality)
            .collect(),
        None => Vec::new(),
    };
    let pool = if preferred.is_empty() { candidates } else { preferred };

    let rate = |v: &SkillVariant| {
        context
            .variant_outcomes(&v.id)
            .map(|c| c.success_rate())
            .unwrap_or(0.5)
    };

    // First max in declaration order.
    pool.into_iter().fold(None, |best: Option<&SkillVariant>, v| match best {
        None => Some(v),
        Some(b) => match rate(v).partial_cmp(&rate(b)) {
            Some(Ordering::Greater) => Some(v),
            _ => Some(b),
        },
    })
}

fn render_steps(steps: &[String], minutes: u16) -> Vec<String> {
    let minutes = minutes.to_string();
    steps
        .iter()
        .map(|s| s.replace(MINUTES_PLACEHOLDER, &minutes))
        .collect()
}
