//! View models handed to the display collaborator and per-word focal splitting.

use alloc::string::{String, ToString};

/// A word split around its focal letter.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WordParts {
    pub before: String,
    pub focal: String,
    pub after: String,
}

impl WordParts {
    /// Split around the middle character. Used whenever the renderer collaborator fails.
    pub fn fallback(word: &str) -> Self {
        let total = word.chars().count();
        split_at_char(word, total.saturating_sub(1) / 2)
    }

    pub fn len(&self) -> usize {
        self.before.len() + self.focal.len() + self.after.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Word decomposition backend, usually remote.
pub trait WordRenderer {
    type Error: core::fmt::Debug;

    fn decompose(&mut self, word: &str) -> Result<WordParts, Self::Error>;
}

/// Optimal-recognition-point split computed locally: the focal letter sits slightly left
/// of centre, counting only alphanumeric characters.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalRenderer;

impl WordRenderer for LocalRenderer {
    type Error = core::convert::Infallible;

    fn decompose(&mut self, word: &str) -> Result<WordParts, Self::Error> {
        Ok(split_at_char(word, orp_char_index(word)))
    }
}

/// Letters never sit further right than this, however long the word.
const MAX_FOCAL_LETTER: usize = 4;

/// Character index of the focal letter. Only alphanumeric characters count towards the
/// word's length, so leading quotes or trailing punctuation do not shift the anchor; words
/// without any fall back to the middle character.
pub fn orp_char_index(word: &str) -> usize {
    let letters = word.chars().filter(|c| c.is_alphanumeric()).count();
    if letters == 0 {
        return word.chars().count().saturating_sub(1) / 2;
    }

    word.chars()
        .enumerate()
        .filter(|(_, c)| c.is_alphanumeric())
        .nth(focal_letter(letters))
        .map_or(0, |(index, _)| index)
}

/// Roughly a quarter into the word: one letter in for 2..=5 letters, then one more per
/// additional four letters.
fn focal_letter(letters: usize) -> usize {
    ((letters + 2) / 4)
        .min(MAX_FOCAL_LETTER)
        .min(letters.saturating_sub(1))
}

fn split_at_char(word: &str, focal_index: usize) -> WordParts {
    let mut indices = word.char_indices().skip(focal_index);
    let Some((start, ch)) = indices.next() else {
        return WordParts {
            before: word.to_string(),
            ..WordParts::default()
        };
    };
    let end = start + ch.len_utf8();

    WordParts {
        before: word[..start].to_string(),
        focal: word[start..end].to_string(),
        after: word[end..].to_string(),
    }
}

/// Everything needed to draw one word.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WordView {
    pub index: usize,
    pub total: usize,
    pub wpm: u16,
    pub progress_pct: u8,
    pub parts: WordParts,
}

/// Session-level view model consumed by the display.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Screen {
    /// Document loaded, not started (or reset).
    Ready { total_words: usize, wpm: u16 },
    Word(WordView),
    Finished { total_words: usize },
}
