//! Loaded documents and their word sequences.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use crate::error::PlaybackError;

mod text_utils;

pub(crate) use text_utils::is_separator;
use text_utils::{count_words, next_word_at};

const ACCEPTED_EXTENSIONS: [&str; 2] = [".txt", ".md"];

/// Ordered, non-empty tokens of one loaded document. Never mutated after construction.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WordSequence {
    words: Vec<String>,
}

impl WordSequence {
    /// Split on whitespace and dash-family characters, dropping empty tokens.
    pub fn from_text(text: &str) -> Self {
        let mut words = Vec::with_capacity(count_words(text));
        let mut cursor = 0usize;

        while let Some((word, next_cursor)) = next_word_at(text, cursor) {
            words.push(word.to_string());
            cursor = next_cursor;
        }

        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    /// Words joined by single spaces, as handed to the speech service.
    pub fn joined(&self) -> String {
        self.words.join(" ")
    }
}

impl<S: AsRef<str>> FromIterator<S> for WordSequence {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            words: iter
                .into_iter()
                .filter(|word| !word.as_ref().is_empty())
                .map(|word| word.as_ref().to_string())
                .collect(),
        }
    }
}

/// Metadata kept alongside the loaded sequence for telemetry and status lines.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DocumentInfo {
    pub file_name: Option<String>,
    pub word_count: usize,
}

/// Accept only plain-text and markdown uploads.
pub fn validate_document_name(name: &str) -> Result<(), PlaybackError> {
    if ACCEPTED_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
        Ok(())
    } else {
        Err(PlaybackError::UnsupportedDocument)
    }
}
