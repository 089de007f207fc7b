//! Lexical heuristics for maladaptive thinking patterns.
//!
//! The word lists are fixed. A match sets a [`PatternFlag`]; it is routing
//! input for the tree and never a reason to escalate.

use std::collections::BTreeSet;

use super::{NormalizedText, PatternFlag};

const ABSOLUTIST_WORDS: &[&str] = &[
    "always",
    "never",
    "nothing",
    "everything",
    "everyone",
    "everybody",
    "nobody",
    "completely",
    "totally",
    "entirely",
    "constantly",
    "forever",
    "impossible",
];

const ABSOLUTIST_PHRASES: &[&str] = &["no one", "every time", "all the time"];

const CATASTROPHIZING_WORDS: &[&str] = &["worst", "ruined", "disaster", "hopeless", "unbearable"];

const CATASTROPHIZING_PHRASES: &[&str] = &[
    "cant handle",
    "cant stand",
    "falling apart",
    "going to lose everything",
];

/// Detects pattern flags in normalized free text.
pub fn detect_patterns(text: &NormalizedText) -> BTreeSet<PatternFlag> {
    let mut flags = BTreeSet::new();
    if matches_any(text, ABSOLUTIST_WORDS, ABSOLUTIST_PHRASES) {
        flags.insert(PatternFlag::AbsolutistLanguage);
    }
    if matches_any(text, CATASTROPHIZING_WORDS, CATASTROPHIZING_PHRASES) {
        flags.insert(PatternFlag::Catastrophizing);
    }
    flags
}

fn matches_any(text: &NormalizedText, words: &[&str], phrases: &[&str]) -> bool {
    if text.tokens().any(|token| words.contains(&token)) {
        return true;
    }
    let padded = format!(" {} ", text.as_str());
    phrases
        .iter()
        .any(|phrase| padded.contains(&format!(" {} ", phrase)))
}
