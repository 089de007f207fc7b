//! Crisis Gate - the non-bypassable safety check in front of the tree.
//!
//! Evaluated on every new signal, including follow-up answers captured
//! mid-tree. Has no configuration and keeps no state between calls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::{SafetyPlanError, SafetyPlanStatus};
use crate::domain::signal::{CrisisCategory, Intensity, Signal};
use crate::domain::user::UserContext;

/// One condition that forces escalation. Ordered by reporting priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EscalationTrigger {
    CrisisLanguage,
    HighIntensity,
    MissingSafetyPlan,
}

impl EscalationTrigger {
    pub fn label(&self) -> &'static str {
        match self {
            EscalationTrigger::CrisisLanguage => "crisis-language",
            EscalationTrigger::HighIntensity => "high-intensity",
            EscalationTrigger::MissingSafetyPlan => "missing-safety-plan",
        }
    }
}

/// Why the gate escalated. Carries every trigger that fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationReason {
    triggers: BTreeSet<EscalationTrigger>,
    crisis_categories: BTreeSet<CrisisCategory>,
    intensity: Intensity,
    threshold: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    safety_plan_problem: Option<SafetyPlanError>,
}

impl EscalationReason {
    /// Highest-priority trigger.
    pub fn primary(&self) -> EscalationTrigger {
        // Constructed only by the gate with at least one trigger.
        self.triggers
            .iter()
            .next()
            .copied()
            .unwrap_or(EscalationTrigger::CrisisLanguage)
    }

    pub fn label(&self) -> &'static str {
        self.primary().label()
    }

    pub fn triggers(&self) -> &BTreeSet<EscalationTrigger> {
        &self.triggers
    }

    pub fn has_trigger(&self, trigger: EscalationTrigger) -> bool {
        self.triggers.contains(&trigger)
    }

    pub fn crisis_categories(&self) -> &BTreeSet<CrisisCategory> {
        &self.crisis_categories
    }

    pub fn intensity(&self) -> Intensity {
        self.intensity
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn safety_plan_problem(&self) -> Option<&SafetyPlanError> {
        self.safety_plan_problem.as_ref()
    }
}

impl fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Outcome of a gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "reason")]
pub enum GateResult {
    Pass,
    Escalate(EscalationReason),
}

impl GateResult {
    pub fn is_escalation(&self) -> bool {
        matches!(self, GateResult::Escalate(_))
    }
}

/// The crisis gate.
///
/// Escalates when intensity reaches the threshold (8, or a lower
/// clinician-set value), when any crisis category matched, or when the
/// user has no valid safety plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrisisGate;

impl CrisisGate {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        signal: &Signal,
        context: &UserContext,
        safety_plan: &SafetyPlanStatus,
    ) -> GateResult {
        let threshold = context.effective_escalation_threshold();
        let mut triggers = BTreeSet::new();

        if signal.has_crisis_language() {
            triggers.insert(EscalationTrigger::CrisisLanguage);
        }
        if signal.intensity().effective() >= threshold {
            triggers.insert(EscalationTrigger::HighIntensity);
        }
        let safety_plan_problem = match safety_plan {
            SafetyPlanStatus::Valid => None,
            SafetyPlanStatus::Invalid(problem) => {
                triggers.insert(EscalationTrigger::MissingSafetyPlan);
                Some(problem.clone())
            }
        };

        if triggers.is_empty() {
            return GateResult::Pass;
        }

        let reason = EscalationReason {
            triggers,
            crisis_categories: signal.crisis_categories().clone(),
            intensity: signal.intensity(),
            threshold,
            safety_plan_problem,
        };
        tracing::warn!(
            reason = reason.label(),
            triggers = ?reason.triggers().iter().map(|t| t.label()).collect::<Vec<_>>(),
            "crisis gate escalated"
        );
        GateResult::Escalate(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::domain::signal::{
        CrisisCategory, PatternFlag, SituationCategory, TimeAvailable,
    };
    use crate::domain::user::{AccessibilityNeed, Modality};
    use proptest::prelude::*;

    fn context() -> UserContext {
        UserContext::new(UserId::new("user-1").unwrap())
    }

    fn evaluate(signal: &Signal, plan: SafetyPlanStatus) -> GateResult {
        CrisisGate::new().evaluate(signal, &context(), &plan)
    }

    #[test]
    fn intensity_nine_without_keywords_escalates_as_high_intensity() {
        let signal = Signal::builder(Intensity::rated(9)).build();
        match evaluate(&signal, SafetyPlanStatus::Valid) {
            GateResult::Escalate(reason) => {
                assert_eq!(reason.label(), "high-intensity");
                assert_eq!(reason.triggers().len(), 1);
            }
            GateResult::Pass => panic!("expected escalation"),
        }
    }

    #[test]
    fn low_intensity_with_valid_plan_passes() {
        let signal = Signal::builder(Intensity::rated(3))
            .situation(SituationCategory::ImpulsiveUrge)
            .build();
        assert_eq!(evaluate(&signal, SafetyPlanStatus::Valid), GateResult::Pass);
    }

    #[test]
    fn crisis_language_escalates_at_any_intensity() {
        let signal = Signal::builder(Intensity::rated(0))
            .crisis(CrisisCategory::SelfHarm)
            .build();
        let GateResult::Escalate(reason) = evaluate(&signal, SafetyPlanStatus::Valid) else {
            panic!("expected escalation");
        };
        assert_eq!(reason.primary(), EscalationTrigger::CrisisLanguage);
        assert!(reason.crisis_categories().contains(&CrisisCategory::SelfHarm));
    }

    #[test]
    fn missing_plan_escalates() {
        let signal = Signal::builder(Intensity::rated(2)).build();
        let GateResult::Escalate(reason) =
            evaluate(&signal, SafetyPlanStatus::Invalid(SafetyPlanError::Missing))
        else {
            panic!("expected escalation");
        };
        assert_eq!(reason.label(), "missing-safety-plan");
        assert_eq!(reason.safety_plan_problem(), Some(&SafetyPlanError::Missing));
    }

    #[test]
    fn pattern_flags_alone_never_escalate() {
        let signal = Signal::builder(Intensity::rated(4))
            .pattern(PatternFlag::AbsolutistLanguage)
            .pattern(PatternFlag::Catastrophizing)
            .build();
        assert_eq!(evaluate(&signal, SafetyPlanStatus::Valid), GateResult::Pass);
    }

    #[test]
    fn unknown_intensity_alone_does_not_escalate() {
        let signal = Signal::builder(Intensity::Unknown).build();
        assert_eq!(evaluate(&signal, SafetyPlanStatus::Valid), GateResult::Pass);
    }

    #[test]
    fn clinician_threshold_lowers_the_bar() {
        let ctx = context().with_escalation_threshold(5).unwrap();
        let signal = Signal::builder(Intensity::rated(5)).build();
        let result = CrisisGate::new().evaluate(&signal, &ctx, &SafetyPlanStatus::Valid);
        assert!(result.is_escalation());
    }

    #[test]
    fn every_fired_trigger_is_reported() {
        let signal = Signal::builder(Intensity::rated(10))
            .crisis(CrisisCategory::SuicidalIdeation)
            .build();
        let GateResult::Escalate(reason) =
            evaluate(&signal, SafetyPlanStatus::Invalid(SafetyPlanError::Missing))
        else {
            panic!("expected escalation");
        };
        assert_eq!(reason.triggers().len(), 3);
        assert_eq!(reason.primary(), EscalationTrigger::CrisisLanguage);
    }

    fn arb_context() -> impl Strategy<Value = UserContext> {
        (
            proptest::option::of(1u8..=8),
            proptest::option::of(prop_oneof![Just(Modality::Movement), Just(Modality::Stillness)]),
            any::<bool>(),
        )
            .prop_map(|(threshold, modality, limited)| {
                let mut ctx = context();
                if let Some(t) = threshold {
                    ctx = ctx.with_escalation_threshold(t).unwrap();
                }
                if let Some(m) = modality {
                    ctx = ctx.with_modality(m);
                }
                if limited {
                    ctx = ctx.with_accessibility(AccessibilityNeed::LimitedMobility);
                }
                ctx
            })
    }

    fn arb_plan_status() -> impl Strategy<Value = SafetyPlanStatus> {
        prop_oneof![
            Just(SafetyPlanStatus::Valid),
            Just(SafetyPlanStatus::Invalid(SafetyPlanError::Missing)),
        ]
    }

    proptest! {
        #[test]
        fn intensity_at_or_above_eight_always_escalates(
            intensity in 8u8..=10,
            situation in proptest::sample::select(SituationCategory::ALL.to_vec()),
            short in any::<bool>(),
            ctx in arb_context(),
            plan in arb_plan_status(),
        ) {
            let mut builder = Signal::builder(Intensity::rated(intensity)).situation(situation);
            if short {
                builder = builder.time_available(TimeAvailable::Short);
            }
            let result = CrisisGate::new().evaluate(&builder.build(), &ctx, &plan);
            match result {
                GateResult::Escalate(reason) => {
                    prop_assert!(reason.has_trigger(EscalationTrigger::HighIntensity));
                }
                GateResult::Pass => prop_assert!(false, "intensity {} passed", intensity),
            }
        }

        #[test]
        fn calm_signal_with_valid_plan_passes_under_default_threshold(intensity in 0u8..8) {
            let signal = Signal::builder(Intensity::rated(intensity)).build();
            prop_assert_eq!(evaluate(&signal, SafetyPlanStatus::Valid), GateResult::Pass);
        }
    }
}
