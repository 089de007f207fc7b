//! Signal value object and its vocabulary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Effective intensity assumed when the user gave no usable rating.
///
/// Moderate-high: routed for safety, but below the escalation threshold
/// so an unrated input alone does not escalate.
pub const UNKNOWN_INTENSITY_PROXY: u8 = 7;

/// Highest rating on the intensity scale.
pub const MAX_INTENSITY: u8 = 10;

/// Self-reported distress intensity.
///
/// Deserialization rejects ratings above [`MAX_INTENSITY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IntensityRepr", into = "IntensityRepr")]
pub enum Intensity {
    /// A rating on the 0..=10 scale.
    Rated(u8),
    /// Missing or malformed rating.
    Unknown,
}

impl Intensity {
    /// Creates a rated intensity, clamping to the 0..=10 scale.
    pub fn rated(value: u8) -> Self {
        Intensity::Rated(value.min(MAX_INTENSITY))
    }

    /// Value used for routing decisions.
    pub fn effective(&self) -> u8 {
        match self {
            Intensity::Rated(v) => *v,
            Intensity::Unknown => UNKNOWN_INTENSITY_PROXY,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Intensity::Rated(_))
    }
}

/// Wire shape of [`Intensity`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
enum IntensityRepr {
    Rated(u8),
    Unknown,
}

impl TryFrom<IntensityRepr> for Intensity {
    type Error = String;

    fn try_from(repr: IntensityRepr) -> Result<Self, Self::Error> {
        match repr {
            IntensityRepr::Rated(v) if v > MAX_INTENSITY => Err(format!(
                "intensity {} is above the 0..={} scale",
                v, MAX_INTENSITY
            )),
            IntensityRepr::Rated(v) => Ok(Intensity::Rated(v)),
            IntensityRepr::Unknown => Ok(Intensity::Unknown),
        }
    }
}

impl From<Intensity> for IntensityRepr {
    fn from(intensity: Intensity) -> Self {
        match intensity {
            Intensity::Rated(v) => IntensityRepr::Rated(v),
            Intensity::Unknown => IntensityRepr::Unknown,
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intensity::Rated(v) => write!(f, "{}", v),
            Intensity::Unknown => write!(f, "unknown"),
        }
    }
}

/// Category of a matched crisis-lexicon term.
///
/// Audit records carry the category, never the user's phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrisisCategory {
    SuicidalIdeation,
    SelfHarm,
    HarmToOthers,
    MedicalEmergency,
}

impl CrisisCategory {
    pub fn label(&self) -> &'static str {
        match self {
            CrisisCategory::SuicidalIdeation => "suicidal-ideation",
            CrisisCategory::SelfHarm => "self-harm",
            CrisisCategory::HarmToOthers => "harm-to-others",
            CrisisCategory::MedicalEmergency => "medical-emergency",
        }
    }
}

/// Maladaptive-pattern marker. Consumed by the tree; never escalates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternFlag {
    AbsolutistLanguage,
    Catastrophizing,
}

impl PatternFlag {
    pub fn label(&self) -> &'static str {
        match self {
            PatternFlag::AbsolutistLanguage => "absolutist-language",
            PatternFlag::Catastrophizing => "catastrophizing",
        }
    }
}

/// Clinically fixed set of situation categories a user can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SituationCategory {
    ImpulsiveUrge,
    EmotionalOverwhelm,
    InterpersonalConflict,
    PhysicalDistress,
    Rumination,
}

impl SituationCategory {
    pub const ALL: [SituationCategory; 5] = [
        SituationCategory::ImpulsiveUrge,
        SituationCategory::EmotionalOverwhelm,
        SituationCategory::InterpersonalConflict,
        SituationCategory::PhysicalDistress,
        SituationCategory::Rumination,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SituationCategory::ImpulsiveUrge => "impulsive-urge",
            SituationCategory::EmotionalOverwhelm => "emotional-overwhelm",
            SituationCategory::InterpersonalConflict => "interpersonal-conflict",
            SituationCategory::PhysicalDistress => "physical-distress",
            SituationCategory::Rumination => "rumination",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

/// How much time the user has for a skill right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeAvailable {
    Short,
    Extended,
}

impl TimeAvailable {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "short" => Some(TimeAvailable::Short),
            "extended" | "long" => Some(TimeAvailable::Extended),
            _ => None,
        }
    }
}

/// Answer to the disambiguation question for mixed presentations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimaryConcern {
    /// The urge to act is most pressing.
    Urge,
    /// Physical sensations are most pressing.
    Body,
}

impl PrimaryConcern {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "urge" => Some(PrimaryConcern::Urge),
            "body" => Some(PrimaryConcern::Body),
            _ => None,
        }
    }
}

/// Conservative defaults applied while extracting a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputIssue {
    MissingIntensity,
    MalformedIntensity,
    IntensityClamped,
    UnrecognizedTag,
    MalformedInput,
}

/// Normalized, immutable view of one user input.
///
/// Created once per input by the extractor and never mutated. Mid-tree
/// follow-up answers produce a new `Signal` of the same type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    intensity: Intensity,
    crisis_categories: BTreeSet<CrisisCategory>,
    pattern_flags: BTreeSet<PatternFlag>,
    free_text_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    consented_text: Option<String>,
    situations: BTreeSet<SituationCategory>,
    time_available: Option<TimeAvailable>,
    primary_concern: Option<PrimaryConcern>,
    tags: BTreeSet<String>,
    input_issues: BTreeSet<InputIssue>,
    lexicon_version: String,
}

impl Signal {
    /// Starts building a signal. The extractor is the normal producer;
    /// the builder exists for replay fixtures and tests.
    pub fn builder(intensity: Intensity) -> SignalBuilder {
        SignalBuilder {
            signal: Signal {
                intensity,
                crisis_categories: BTreeSet::new(),
                pattern_flags: BTreeSet::new(),
                free_text_hash: None,
                consented_text: None,
                situations: BTreeSet::new(),
                time_available: None,
                primary_concern: None,
                tags: BTreeSet::new(),
                input_issues: BTreeSet::new(),
                lexicon_version: String::new(),
            },
        }
    }

    pub fn intensity(&self) -> Intensity {
        self.intensity
    }

    pub fn crisis_categories(&self) -> &BTreeSet<CrisisCategory> {
        &self.crisis_categories
    }

    pub fn has_crisis_language(&self) -> bool {
        !self.crisis_categories.is_empty()
    }

    pub fn pattern_flags(&self) -> &BTreeSet<PatternFlag> {
        &self.pattern_flags
    }

    pub fn has_pattern(&self, flag: PatternFlag) -> bool {
        self.pattern_flags.contains(&flag)
    }

    pub fn free_text_hash(&self) -> Option<&str> {
        self.free_text_hash.as_deref()
    }

    pub fn consented_text(&self) -> Option<&str> {
        self.consented_text.as_deref()
    }

    pub fn situations(&self) -> &BTreeSet<SituationCategory> {
        &self.situations
    }

    pub fn time_available(&self) -> Option<TimeAvailable> {
        self.time_available
    }

    pub fn primary_concern(&self) -> Option<PrimaryConcern> {
        self.primary_concern
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn input_issues(&self) -> &BTreeSet<InputIssue> {
        &self.input_issues
    }

    pub fn lexicon_version(&self) -> &str {
        &self.lexicon_version
    }

    /// Copy suitable for audit sinks: everything except consented raw text.
    pub fn audit_snapshot(&self) -> Signal {
        Signal {
            consented_text: None,
            ..self.clone()
        }
    }
}

/// Builder for [`Signal`].
#[derive(Debug, Clone)]
pub struct SignalBuilder {
    signal: Signal,
}

impl SignalBuilder {
    pub fn crisis(mut self, category: CrisisCategory) -> Self {
        self.signal.crisis_categories.insert(category);
        self
    }

    pub fn pattern(mut self, flag: PatternFlag) -> Self {
        self.signal.pattern_flags.insert(flag);
        self
    }

    pub fn free_text_hash(mut self, hash: impl Into<String>) -> Self {
        self.signal.free_text_hash = Some(hash.into());
        self
    }

    pub fn consented_text(mut self, text: impl Into<String>) -> Self {
        self.signal.consented_text = Some(text.into());
        self
    }

    pub fn situation(mut self, situation: SituationCategory) -> Self {
        self.signal.situations.insert(situation);
        self
    }

    pub fn time_available(mut self, time: TimeAvailable) -> Self {
        self.signal.time_available = Some(time);
        self
    }

    pub fn primary_concern(mut self, concern: PrimaryConcern) -> Self {
        self.signal.primary_concern = Some(concern);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.signal.tags.insert(tag.into());
        self
    }

    pub fn issue(mut self, issue: InputIssue) -> Self {
        self.signal.input_issues.insert(issue);
        self
    }

    pub fn lexicon_version(mut self, version: impl Into<String>) -> Self {
        self.signal.lexicon_version = version.into();
        self
    }

    pub fn build(self) -> Signal {
        self.signal
    }
}
