//! Position within a loaded word sequence.

use crate::{content::WordSequence, error::PlaybackError};

/// `index == words.len()` is the finished position.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WordCursor {
    words: WordSequence,
    index: usize,
}

impl WordCursor {
    pub fn new(words: WordSequence) -> Self {
        Self { words, index: 0 }
    }

    pub fn words(&self) -> &WordSequence {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.words.len()
    }

    pub fn set(&mut self, index: usize) -> Result<(), PlaybackError> {
        if index > self.words.len() {
            return Err(PlaybackError::OutOfRange {
                index,
                len: self.words.len(),
            });
        }
        self.index = index;
        Ok(())
    }

    pub fn rewind(&mut self) {
        self.index = 0;
    }

    /// Step forward by one word. Returns `false` when already finished.
    pub fn advance(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Word under the cursor, `None` once finished.
    pub fn current(&self) -> Option<&str> {
        self.words.get(self.index)
    }

    /// Share of the document shown so far, counting the current word.
    pub fn progress_pct(&self) -> u8 {
        let total = self.words.len();
        if total == 0 {
            return 0;
        }
        let shown = (self.index + 1).min(total);
        (shown * 100 / total) as u8
    }
}
