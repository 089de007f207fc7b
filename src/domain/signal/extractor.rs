//! Signal extraction from raw session input.
//!
//! `extract` is total. Malformed or missing fields degrade to conservative
//! defaults and are recorded as [`InputIssue`]s on the signal; they are
//! never surfaced as failures.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::{
    detect_patterns, CrisisLexicon, InputIssue, Intensity, NormalizedText, PrimaryConcern,
    Signal, SignalBuilder, SituationCategory, TimeAvailable, MAX_INTENSITY,
};

/// Raw input as received from the presentation layer.
///
/// Deserializes from any JSON value. Fields of the wrong type are dropped
/// rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct RawInput {
    /// Intensity as sent: number, numeric string, or anything else.
    pub intensity: Option<Value>,
    pub free_text: Option<String>,
    /// Selected tags, either bare (`impulsive-urge`) or `key=value`.
    pub tags: Vec<String>,
    /// The user agreed to keep the raw free text alongside its hash.
    pub store_text_consent: bool,
    #[serde(skip)]
    malformed: bool,
}

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_intensity(mut self, value: i64) -> Self {
        self.intensity = Some(Value::from(value));
        self
    }

    pub fn with_free_text(mut self, text: impl Into<String>) -> Self {
        self.free_text = Some(text.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_consent(mut self) -> Self {
        self.store_text_consent = true;
        self
    }
}

impl From<Value> for RawInput {
    fn from(value: Value) -> Self {
        let Value::Object(map) = value else {
            return RawInput {
                malformed: true,
                ..RawInput::default()
            };
        };

        let mut malformed = false;
        let free_text = match map.get("free_text") {
            Some(Value::String(s)) => Some(s.clone()),
            None | Some(Value::Null) => None,
            Some(_) => {
                malformed = true;
                None
            }
        };
        let tags = match map.get("tags") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    _ => {
                        malformed = true;
                        None
                    }
                })
                .collect(),
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                malformed = true;
                Vec::new()
            }
        };

        RawInput {
            intensity: map.get("intensity").filter(|v| !v.is_null()).cloned(),
            free_text,
            tags,
            store_text_consent: matches!(map.get("store_text_consent"), Some(Value::Bool(true))),
            malformed,
        }
    }
}

/// Turns raw input into a [`Signal`] against a versioned crisis lexicon.
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    lexicon: Arc<CrisisLexicon>,
}

impl SignalExtractor {
    pub fn new(lexicon: Arc<CrisisLexicon>) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &CrisisLexicon {
        &self.lexicon
    }

    pub fn extract(&self, raw: &RawInput) -> Signal {
        let (intensity, intensity_issue) = parse_intensity(raw.intensity.as_ref());
        let mut builder = Signal::builder(intensity).lexicon_version(self.lexicon.version());
        if let Some(issue) = intensity_issue {
            tracing::debug!(issue = ?issue, "intensity degraded to conservative default");
            builder = builder.issue(issue);
        }
        if raw.malformed {
            builder = builder.issue(InputIssue::MalformedInput);
        }

        if let Some(text) = raw.free_text.as_deref() {
            let normalized = NormalizedText::new(text);
            if !normalized.is_empty() {
                builder = builder.free_text_hash(hash_text(&normalized));
                if raw.store_text_consent {
                    builder = builder.consented_text(text);
                }

                let categories = self.lexicon.match_categories(&normalized);
                if !categories.is_empty() {
                    let labels: Vec<&str> = categories.iter().map(|c| c.label()).collect();
                    tracing::info!(
                        categories = ?labels,
                        lexicon = self.lexicon.version(),
                        "crisis language matched"
                    );
                }
                for category in categories {
                    builder = builder.crisis(category);
                }
                for flag in detect_patterns(&normalized) {
                    builder = builder.pattern(flag);
                }
            }
        }

        for tag in &raw.tags {
            builder = apply_tag(builder, tag);
        }

        builder.build()
    }
}

impl Default for SignalExtractor {
    fn default() -> Self {
        Self::new(CrisisLexicon::builtin())
    }
}

/// Extracts a signal with the built-in lexicon.
pub fn extract(raw: &RawInput) -> Signal {
    SignalExtractor::default().extract(raw)
}

fn parse_intensity(value: Option<&Value>) -> (Intensity, Option<InputIssue>) {
    let number = match value {
        None => return (Intensity::Unknown, Some(InputIssue::MissingIntensity)),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match number {
        Some(n) if n.is_finite() && n >= 0.0 => {
            let rounded = n.round();
            if rounded > f64::from(MAX_INTENSITY) {
                (Intensity::Rated(MAX_INTENSITY), Some(InputIssue::IntensityClamped))
            } else {
                (Intensity::Rated(rounded as u8), None)
            }
        }
        _ => (Intensity::Unknown, Some(InputIssue::MalformedIntensity)),
    }
}

fn apply_tag(builder: SignalBuilder, tag: &str) -> SignalBuilder {
    let normalized = tag.trim().to_lowercase();
    let (key, value) = match normalized.split_once('=') {
        Some((k, v)) => (Some(k.trim()), v.trim()),
        None => (None, normalized.as_str()),
    };

    let builder = builder.tag(normalized.clone());
    match (key, SituationCategory::from_label(value)) {
        (Some("situation") | None, Some(category)) => builder.situation(category),
        (Some("time-available"), _) => match TimeAvailable::from_label(value) {
            Some(time) => builder.time_available(time),
            None => builder.issue(InputIssue::UnrecognizedTag),
        },
        (Some("primary-concern"), _) => match PrimaryConcern::from_label(value) {
            Some(concern) => builder.primary_concern(concern),
            None => builder.issue(InputIssue::UnrecognizedTag),
        },
        _ => builder.issue(InputIssue::UnrecognizedTag),
    }
}

fn hash_text(text: &NormalizedText) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_str().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::{CrisisCategory, PatternFlag};
    use serde_json::json;

    #[test]
    fn extracts_rated_intensity_and_tags() {
        let raw = RawInput::new()
            .with_intensity(3)
            .with_tag("situation=impulsive-urge")
            .with_tag("time-available=short");
        let signal = extract(&raw);

        assert_eq!(signal.intensity(), Intensity::Rated(3));
        assert!(signal.situations().contains(&SituationCategory::ImpulsiveUrge));
        assert_eq!(signal.time_available(), Some(TimeAvailable::Short));
        assert!(signal.input_issues().is_empty());
        assert!(!signal.has_crisis_language());
    }

    #[test]
    fn missing_intensity_is_unknown_not_low() {
        let signal = extract(&RawInput::new());
        assert_eq!(signal.intensity(), Intensity::Unknown);
        assert!(signal.intensity().effective() >= 7);
        assert!(signal.input_issues().contains(&InputIssue::MissingIntensity));
    }

    #[test]
    fn malformed_json_degrades_instead_of_failing() {
        let raw: RawInput = serde_json::from_value(json!({
            "intensity": "very high",
            "free_text": 42,
            "tags": ["rumination", 7]
        }))
        .unwrap();
        let signal = extract(&raw);

        assert_eq!(signal.intensity(), Intensity::Unknown);
        assert!(signal.input_issues().contains(&InputIssue::MalformedIntensity));
        assert!(signal.input_issues().contains(&InputIssue::MalformedInput));
        assert!(signal.situations().contains(&SituationCategory::Rumination));
    }

    #[test]
    fn non_object_json_is_an_empty_input() {
        let raw: RawInput = serde_json::from_value(json!([1, 2, 3])).unwrap();
        let signal = extract(&raw);
        assert_eq!(signal.intensity(), Intensity::Unknown);
        assert!(signal.input_issues().contains(&InputIssue::MalformedInput));
    }

    #[test]
    fn numeric_strings_and_floats_are_accepted() {
        let a: RawInput = serde_json::from_value(json!({"intensity": "6"})).unwrap();
        let b: RawInput = serde_json::from_value(json!({"intensity": 8.4})).unwrap();
        assert_eq!(extract(&a).intensity(), Intensity::Rated(6));
        assert_eq!(extract(&b).intensity(), Intensity::Rated(8));
    }

    #[test]
    fn out_of_scale_ratings_clamp_upward_and_negatives_are_unknown() {
        let high = extract(&RawInput::new().with_intensity(15));
        assert_eq!(high.intensity(), Intensity::Rated(10));
        assert!(high.input_issues().contains(&InputIssue::IntensityClamped));

        let negative = extract(&RawInput::new().with_intensity(-2));
        assert_eq!(negative.intensity(), Intensity::Unknown);
    }

    #[test]
    fn crisis_language_is_captured_by_category_only() {
        let raw = RawInput::new()
            .with_intensity(2)
            .with_free_text("honestly I just want to die");
        let signal = extract(&raw);

        assert_eq!(
            signal.crisis_categories().iter().copied().collect::<Vec<_>>(),
            vec![CrisisCategory::SuicidalIdeation]
        );
        assert!(signal.consented_text().is_none());
        assert_eq!(signal.free_text_hash().map(str::len), Some(64));
    }

    #[test]
    fn consented_text_is_kept() {
        let raw = RawInput::new()
            .with_free_text("Everything is going wrong")
            .with_consent();
        let signal = extract(&raw);

        assert_eq!(signal.consented_text(), Some("Everything is going wrong"));
        assert!(signal.has_pattern(PatternFlag::AbsolutistLanguage));
        assert!(!signal.has_crisis_language());
    }

    #[test]
    fn hash_ignores_case_and_punctuation() {
        let a = extract(&RawInput::new().with_free_text("I feel awful!"));
        let b = extract(&RawInput::new().with_free_text("i FEEL awful"));
        assert_eq!(a.free_text_hash(), b.free_text_hash());
    }

    #[test]
    fn unrecognized_tags_are_kept_and_flagged() {
        let signal = extract(&RawInput::new().with_intensity(4).with_tag("mood=grumpy"));
        assert!(signal.tags().contains("mood=grumpy"));
        assert!(signal.input_issues().contains(&InputIssue::UnrecognizedTag));
    }

    #[test]
    fn signal_records_lexicon_version() {
        let signal = extract(&RawInput::new().with_intensity(1));
        assert_eq!(signal.lexicon_version(), crate::domain::signal::DEFAULT_LEXICON_VERSION);
    }
}
