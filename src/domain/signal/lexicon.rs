//! Versioned crisis lexicon and text normalization.
//!
//! Matching is case-insensitive and runs two ways over normalized text:
//! plain substring, and lemma sequence (suffix-stripped tokens), so that
//! "Cutting myself" matches the entry "cut myself".

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::CrisisCategory;

/// Version of the built-in lexicon.
pub const DEFAULT_LEXICON_VERSION: &str = "crisis-lexicon-2026.1";

/// Terms shipped with the engine, by category.
const DEFAULT_TERMS: &[(&str, CrisisCategory)] = &[
    ("kill myself", CrisisCategory::SuicidalIdeation),
    ("end my life", CrisisCategory::SuicidalIdeation),
    ("take my own life", CrisisCategory::SuicidalIdeation),
    ("suicide", CrisisCategory::SuicidalIdeation),
    ("suicidal", CrisisCategory::SuicidalIdeation),
    ("want to die", CrisisCategory::SuicidalIdeation),
    ("wish i was dead", CrisisCategory::SuicidalIdeation),
    ("better off dead", CrisisCategory::SuicidalIdeation),
    ("no reason to live", CrisisCategory::SuicidalIdeation),
    ("end it all", CrisisCategory::SuicidalIdeation),
    ("hurt myself", CrisisCategory::SelfHarm),
    ("harm myself", CrisisCategory::SelfHarm),
    ("cut myself", CrisisCategory::SelfHarm),
    ("burn myself", CrisisCategory::SelfHarm),
    ("self harm", CrisisCategory::SelfHarm),
    ("hurt someone", CrisisCategory::HarmToOthers),
    ("kill someone", CrisisCategory::HarmToOthers),
    ("kill him", CrisisCategory::HarmToOthers),
    ("kill her", CrisisCategory::HarmToOthers),
    ("kill them", CrisisCategory::HarmToOthers),
    ("overdose", CrisisCategory::MedicalEmergency),
    ("too many pills", CrisisCategory::MedicalEmergency),
    ("cant breathe", CrisisCategory::MedicalEmergency),
    ("chest pain", CrisisCategory::MedicalEmergency),
];

static DEFAULT_LEXICON: Lazy<Arc<CrisisLexicon>> = Lazy::new(|| {
    Arc::new(CrisisLexicon::new(
        DEFAULT_LEXICON_VERSION,
        DEFAULT_TERMS
            .iter()
            .map(|(term, category)| LexiconEntry {
                term: (*term).to_string(),
                category: *category,
            })
            .collect(),
    ))
});

/// One lexicon term and the category it reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub term: String,
    pub category: CrisisCategory,
}

/// Versioned set of crisis terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "LexiconDefinition")]
pub struct CrisisLexicon {
    version: String,
    entries: Vec<LexiconEntry>,
    #[serde(skip)]
    compiled: Vec<CompiledEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct LexiconDefinition {
    version: String,
    entries: Vec<LexiconEntry>,
}

impl From<LexiconDefinition> for CrisisLexicon {
    fn from(def: LexiconDefinition) -> Self {
        CrisisLexicon::new(def.version, def.entries)
    }
}

#[derive(Debug, Clone)]
struct CompiledEntry {
    normalized: String,
    lemmas: Vec<String>,
    category: CrisisCategory,
}

impl CrisisLexicon {
    pub fn new(version: impl Into<String>, entries: Vec<LexiconEntry>) -> Self {
        let compiled = entries
            .iter()
            .filter_map(|entry| {
                let text = NormalizedText::new(&entry.term);
                if text.is_empty() {
                    return None;
                }
                Some(CompiledEntry {
                    normalized: text.as_str().to_string(),
                    lemmas: text.lemmas().to_vec(),
                    category: entry.category,
                })
            })
            .collect();

        Self {
            version: version.into(),
            entries,
            compiled,
        }
    }

    /// The lexicon shipped with the engine.
    pub fn builtin() -> Arc<CrisisLexicon> {
        Arc::clone(&DEFAULT_LEXICON)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn entries(&self) -> &[LexiconEntry] {
        &self.entries
    }

    /// Categories of every entry found in `text`.
    pub fn match_categories(&self, text: &NormalizedText) -> BTreeSet<CrisisCategory> {
        self.compiled
            .iter()
            .filter(|entry| {
                text.as_str().contains(&entry.normalized) || text.contains_lemmas(&entry.lemmas)
            })
            .map(|entry| entry.category)
            .collect()
    }
}

/// Lowercased text with punctuation folded to single spaces.
///
/// Apostrophes are dropped so "can't" and "cant" normalize alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    text: String,
    lemmas: Vec<String>,
}

impl NormalizedText {
    pub fn new(raw: &str) -> Self {
        let mut folded = String::with_capacity(raw.len());
        for ch in raw.chars() {
            if ch == '\'' || ch == '\u{2019}' {
                continue;
            }
            if ch.is_alphanumeric() {
                folded.extend(ch.to_lowercase());
            } else {
                folded.push(' ');
            }
        }
        let tokens: Vec<&str> = folded.split_whitespace().collect();
        let lemmas = tokens.iter().map(|t| lemma(t)).collect();

        Self {
            text: tokens.join(" "),
            lemmas,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.text.split(' ').filter(|t| !t.is_empty())
    }

    pub fn lemmas(&self) -> &[String] {
        &self.lemmas
    }

    /// True when `needle` appears as a contiguous lemma run.
    pub fn contains_lemmas(&self, needle: &[String]) -> bool {
        if needle.is_empty() || needle.len() > self.lemmas.len() {
            return false;
        }
        self.lemmas.windows(needle.len()).any(|window| window == needle)
    }
}

/// Crude English lemma: strips common inflections and a doubled final consonant.
fn lemma(token: &str) -> String {
    let mut stem = token;
    for suffix in ["ing", "ed", "es", "s"] {
        if stem.len() > suffix.len() + 2 && stem.ends_with(suffix) && !stem.ends_with("ss") {
            stem = &stem[..stem.len() - suffix.len()];
            break;
        }
    }
    let mut lemma = stem.to_string();
    let bytes = lemma.as_bytes();
    let len = bytes.len();
    if len > 3
        && bytes[len - 1].is_ascii_alphabetic()
        && bytes[len - 1] == bytes[len - 2]
        && !b"aeiouls".contains(&bytes[len - 1])
    {
        lemma.pop();
    }
    if lemma.len() > 4 && lemma.ends_with('e') {
        lemma.pop();
    }
    lemma
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(text: &str) -> BTreeSet<CrisisCategory> {
        CrisisLexicon::builtin().match_categories(&NormalizedText::new(text))
    }

    #[test]
    fn normalization_lowercases_and_folds_punctuation() {
        let text = NormalizedText::new("I CAN'T...  breathe!!");
        assert_eq!(text.as_str(), "i cant breathe");
    }

    #[test]
    fn matches_case_insensitive_substring() {
        assert_eq!(
            categories("Sometimes I think about SUICIDE"),
            BTreeSet::from([CrisisCategory::SuicidalIdeation])
        );
    }

    #[test]
    fn matches_inflected_forms_through_lemmas() {
        assert_eq!(
            categories("I keep cutting myself when it gets bad"),
            BTreeSet::from([CrisisCategory::SelfHarm])
        );
        assert_eq!(
            categories("I think I overdosed"),
            BTreeSet::from([CrisisCategory::MedicalEmergency])
        );
    }

    #[test]
    fn reports_every_matched_category_once() {
        let found = categories("I want to die and I might hurt myself, I want to die");
        assert_eq!(
            found,
            BTreeSet::from([CrisisCategory::SuicidalIdeation, CrisisCategory::SelfHarm])
        );
    }

    #[test]
    fn benign_text_matches_nothing() {
        assert!(categories("My coworker ignored me and I feel annoyed").is_empty());
        assert!(categories("").is_empty());
    }

    #[test]
    fn lemma_strips_common_suffixes() {
        assert_eq!(lemma("cutting"), "cut");
        assert_eq!(lemma("kills"), "kill");
        assert_eq!(lemma("overdose"), "overdos");
        assert_eq!(lemma("overdosed"), "overdos");
        assert_eq!(lemma("myself"), "myself");
    }

    #[test]
    fn custom_lexicon_deserializes_and_compiles() {
        let yaml = "version: test-1\nentries:\n  - term: jump off\n    category: suicidal-ideation\n";
        let lexicon: CrisisLexicon = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(lexicon.version(), "test-1");
        assert_eq!(
            lexicon.match_categories(&NormalizedText::new("I might JUMP OFF the bridge")),
            BTreeSet::from([CrisisCategory::SuicidalIdeation])
        );
    }
}
