//! Signal module - normalized view of user input.
//!
//! - `value` - the immutable [`Signal`] and its vocabulary
//! - `lexicon` - versioned crisis lexicon with substring and lemma matching
//! - `patterns` - fixed maladaptive-pattern heuristics
//! - `extractor` - total `extract(RawInput) -> Signal`

mod extractor;
mod lexicon;
mod patterns;
mod value;

pub use extractor::{extract, RawInput, SignalExtractor};
pub use lexicon::{CrisisLexicon, LexiconEntry, NormalizedText, DEFAULT_LEXICON_VERSION};
pub use patterns::detect_patterns;
pub use value::{
    CrisisCategory, InputIssue, Intensity, PatternFlag, PrimaryConcern, Signal, SignalBuilder,
    SituationCategory, TimeAvailable, MAX_INTENSITY, UNKNOWN_INTENSITY_PROXY,
};
