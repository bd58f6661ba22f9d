//! Per-word display duration.

use crate::settings::ReaderConfig;

const SENTENCE_TERMINATORS: [char; 5] = ['.', '!', '?', ';', ':'];
const CLAUSE_SEPARATOR: char = ',';
const DEFAULT_SENTENCE_PAUSE_MS: f64 = 100.0;
const DEFAULT_CLAUSE_PAUSE_MS: f64 = 50.0;

/// Which revision of the pause formula to apply.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PacingFormula {
    /// `base + punctuation`.
    PunctuationOnly,
    /// `base + len² · base/1000 + punctuation`.
    #[default]
    LengthAndPunctuation,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Punctuation {
    None,
    Clause,
    Sentence,
}

/// Sentence terminators win over commas when a word carries both.
pub fn classify_punctuation(word: &str) -> Punctuation {
    if word.contains(SENTENCE_TERMINATORS) {
        Punctuation::Sentence
    } else if word.contains(CLAUSE_SEPARATOR) {
        Punctuation::Clause
    } else {
        Punctuation::None
    }
}

/// Display duration in milliseconds with the default pause constants.
pub fn delay(word: &str, wpm: u16) -> f64 {
    compute(
        word,
        wpm,
        PacingFormula::LengthAndPunctuation,
        DEFAULT_SENTENCE_PAUSE_MS,
        DEFAULT_CLAUSE_PAUSE_MS,
    )
}

/// Display duration in milliseconds using the configured formula and pauses.
pub fn delay_with(word: &str, wpm: u16, config: &ReaderConfig) -> f64 {
    compute(
        word,
        wpm,
        config.formula,
        config.sentence_pause_ms as f64,
        config.clause_pause_ms as f64,
    )
}

/// [`delay_with`] rounded to whole milliseconds for scheduling.
pub fn delay_ms(word: &str, wpm: u16, config: &ReaderConfig) -> u64 {
    // Delay is never negative, so adding one half truncates to the nearest value.
    (delay_with(word, wpm, config) + 0.5) as u64
}

fn compute(
    word: &str,
    wpm: u16,
    formula: PacingFormula,
    sentence_pause_ms: f64,
    clause_pause_ms: f64,
) -> f64 {
    let base = 60_000.0 / wpm.max(1) as f64;

    let length_penalty = match formula {
        PacingFormula::PunctuationOnly => 0.0,
        PacingFormula::LengthAndPunctuation => {
            let len = word.chars().count() as f64;
            len * len * (base / 1_000.0)
        }
    };

    let punctuation = match classify_punctuation(word) {
        Punctuation::Sentence => sentence_pause_ms,
        Punctuation::Clause => clause_pause_ms,
        Punctuation::None => 0.0,
    };

    base + length_penalty + punctuation
}
