//! Branch predicates and their declared outcome domains.
//!
//! The predicate set is closed: each variant is a pure function of
//! `(Signal, UserContext)` onto a fixed, enumerable domain of outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::SkillId;
use crate::domain::signal::{PatternFlag, PrimaryConcern, Signal, SituationCategory, TimeAvailable};
use crate::domain::user::UserContext;

/// A branch node's routing question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Predicate {
    /// Which situation the user selected.
    Situation,
    /// Which band the effective intensity falls in.
    IntensityBand,
    /// How much time the user has.
    TimeAvailable,
    /// Whether a maladaptive pattern was flagged.
    Pattern { flag: PatternFlag },
    /// Answer to the disambiguation question.
    PrimaryConcern,
    /// How a skill has worked for this user before.
    SkillHistory { skill: SkillId },
}

impl Predicate {
    /// Every outcome this predicate can produce.
    pub fn domain(&self) -> Vec<Outcome> {
        match self {
            Predicate::Situation => {
                let mut outcomes: Vec<Outcome> = SituationCategory::ALL
                    .into_iter()
                    .map(SituationOutcome::Selected)
                    .map(Outcome::Situation)
                    .collect();
                outcomes.push(Outcome::Situation(SituationOutcome::Ambiguous));
                outcomes.push(Outcome::Situation(SituationOutcome::Unspecified));
                outcomes
            }
            Predicate::IntensityBand => [IntensityBand::Low, IntensityBand::Moderate, IntensityBand::High]
                .into_iter()
                .map(Outcome::Intensity)
                .collect(),
            Predicate::TimeAvailable => vec![
                Outcome::Time(TimeOutcome::Short),
                Outcome::Time(TimeOutcome::Extended),
                Outcome::Time(TimeOutcome::Unknown),
            ],
            Predicate::Pattern { .. } => vec![Outcome::Pattern(true), Outcome::Pattern(false)],
            Predicate::PrimaryConcern => vec![
                Outcome::Concern(ConcernOutcome::Urge),
                Outcome::Concern(ConcernOutcome::Body),
                Outcome::Concern(ConcernOutcome::Undetermined),
            ],
            Predicate::SkillHistory { .. } => vec![
                Outcome::History(HistoryOutcome::Effective),
                Outcome::History(HistoryOutcome::Ineffective),
                Outcome::History(HistoryOutcome::Untried),
            ],
        }
    }

    /// Parses an edge label into one of this predicate's outcomes.
    pub fn parse_outcome(&self, label: &str) -> Option<Outcome> {
        self.domain().into_iter().find(|o| o.label() == label)
    }

    /// Applies the predicate. Pure.
    pub fn evaluate(&self, signal: &Signal, context: &UserContext) -> Outcome {
        match self {
            Predicate::Situation => {
                let situations = signal.situations();
                let outcome = match situations.len() {
                    0 => SituationOutcome::Unspecified,
                    1 => situations
                        .iter()
                        .next()
                        .copied()
                        .map_or(SituationOutcome::Unspecified, SituationOutcome::Selected),
                    _ => SituationOutcome::Ambiguous,
                };
                Outcome::Situation(outcome)
            }
            Predicate::IntensityBand => {
                Outcome::Intensity(IntensityBand::of(signal.intensity().effective()))
            }
            Predicate::TimeAvailable => Outcome::Time(match signal.time_available() {
                Some(TimeAvailable::Short) => TimeOutcome::Short,
                Some(TimeAvailable::Extended) => TimeOutcome::Extended,
                None => TimeOutcome::Unknown,
            }),
            Predicate::Pattern { flag } => Outcome::Pattern(signal.has_pattern(*flag)),
            Predicate::PrimaryConcern => Outcome::Concern(match signal.primary_concern() {
                Some(PrimaryConcern::Urge) => ConcernOutcome::Urge,
                Some(PrimaryConcern::Body) => ConcernOutcome::Body,
                None => ConcernOutcome::Undetermined,
            }),
            Predicate::SkillHistory { skill } => Outcome::History(match context.skill_outcomes(skill) {
                Some(counts) if counts.total() > 0 => {
                    if counts.failures > counts.successes {
                        HistoryOutcome::Ineffective
                    } else {
                        HistoryOutcome::Effective
                    }
                }
                _ => HistoryOutcome::Untried,
            }),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Situation => write!(f, "situation"),
            Predicate::IntensityBand => write!(f, "intensity-band"),
            Predicate::TimeAvailable => write!(f, "time-available"),
            Predicate::Pattern { flag } => write!(f, "pattern({})", flag.label()),
            Predicate::PrimaryConcern => write!(f, "primary-concern"),
            Predicate::SkillHistory { skill } => write!(f, "skill-history({skill})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SituationOutcome {
    Selected(SituationCategory),
    /// More than one situation selected, e.g. impulsive urge plus physical distress.
    Ambiguous,
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntensityBand {
    /// 0..=3
    Low,
    /// 4..=6
    Moderate,
    /// 7..=10, and unknown intensity
    High,
}

impl IntensityBand {
    pub fn of(effective: u8) -> Self {
        match effective {
            0..=3 => IntensityBand::Low,
            4..=6 => IntensityBand::Moderate,
            _ => IntensityBand::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeOutcome {
    Short,
    Extended,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConcernOutcome {
    Urge,
    Body,
    Undetermined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryOutcome {
    Effective,
    Ineffective,
    Untried,
}

/// A predicate result, named on edges by its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Situation(SituationOutcome),
    Intensity(IntensityBand),
    Time(TimeOutcome),
    Pattern(bool),
    Concern(ConcernOutcome),
    History(HistoryOutcome),
}

impl Outcome {
    /// Edge label used in catalog files.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Situation(SituationOutcome::Selected(category)) => category.label(),
            Outcome::Situation(SituationOutcome::Ambiguous) => "ambiguous",
            Outcome::Situation(SituationOutcome::Unspecified) => "unspecified",
            Outcome::Intensity(IntensityBand::Low) => "low",
            Outcome::Intensity(IntensityBand::Moderate) => "moderate",
            Outcome::Intensity(IntensityBand::High) => "high",
            Outcome::Time(TimeOutcome::Short) => "short",
            Outcome::Time(TimeOutcome::Extended) => "extended",
            Outcome::Time(TimeOutcome::Unknown) => "unknown",
            Outcome::Pattern(true) => "present",
            Outcome::Pattern(false) => "absent",
            Outcome::Concern(ConcernOutcome::Urge) => "urge",
            Outcome::Concern(ConcernOutcome::Body) => "body",
            Outcome::Concern(ConcernOutcome::Undetermined) => "undetermined",
            Outcome::History(HistoryOutcome::Effective) => "effective",
            Outcome::History(HistoryOutcome::Ineffective) => "ineffective",
            Outcome::History(HistoryOutcome::Untried) => "untried",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
