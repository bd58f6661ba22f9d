//! Speech-synced playback: alignment lookup and the synthesis collaborator.

use alloc::vec::Vec;

use log::debug;

/// Closed interval `[start_ms, end_ms]` during which `word_index` is spoken.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AlignmentEntry {
    pub word_index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl AlignmentEntry {
    pub const fn new(word_index: usize, start_ms: u64, end_ms: u64) -> Self {
        Self {
            word_index,
            start_ms,
            end_ms,
        }
    }

    pub const fn contains(&self, time_ms: u64) -> bool {
        self.start_ms <= time_ms && time_ms <= self.end_ms
    }
}

/// Word timings produced by the speech aligner, ordered by word and start time.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AlignmentTable {
    entries: Vec<AlignmentEntry>,
}

impl AlignmentTable {
    pub fn new(entries: Vec<AlignmentEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[AlignmentEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// End of the last spoken word.
    pub fn duration_ms(&self) -> u64 {
        self.entries.iter().map(|e| e.end_ms).max().unwrap_or(0)
    }

    /// First entry containing `time_ms`. Overlapping intervals resolve to the earliest entry.
    pub fn word_at(&self, time_ms: u64) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.contains(time_ms))
            .map(|entry| entry.word_index)
    }
}

impl FromIterator<AlignmentEntry> for AlignmentTable {
    fn from_iter<I: IntoIterator<Item = AlignmentEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Opaque id of one synthesized audio track. Clock events carry it so that events from an
/// abandoned track can be told apart from the live one.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct AudioHandle(pub u32);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Synthesis {
    pub handle: AudioHandle,
    pub alignment: AlignmentTable,
}

/// Text-to-speech backend with word alignment.
pub trait SpeechService {
    type Error: core::fmt::Debug;

    fn synthesize(&mut self, text: &str, wpm: u16) -> Result<Synthesis, Self::Error>;
}

/// Speech service for sessions that never request audio.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSpeech;

impl SpeechService for NoSpeech {
    type Error = ();

    fn synthesize(&mut self, _text: &str, _wpm: u16) -> Result<Synthesis, Self::Error> {
        Err(())
    }
}

/// Maps audio clock readings to cursor positions for the live track.
#[derive(Clone, Debug)]
pub struct AudioAdvancer {
    handle: AudioHandle,
    alignment: AlignmentTable,
    last_time_ms: u64,
}

impl AudioAdvancer {
    pub fn new(synthesis: Synthesis) -> Self {
        Self {
            handle: synthesis.handle,
            alignment: synthesis.alignment,
            last_time_ms: 0,
        }
    }

    pub fn handle(&self) -> AudioHandle {
        self.handle
    }

    pub fn last_time_ms(&self) -> u64 {
        self.last_time_ms
    }

    /// Target index for a clock reading, if it differs from `cursor` and lies inside a
    /// document of `len` words. Gaps in the alignment leave the cursor alone.
    pub fn target_for(&mut self, time_ms: u64, cursor: usize, len: usize) -> Option<usize> {
        self.last_time_ms = time_ms;
        let index = self.alignment.word_at(time_ms)?;
        if index >= len {
            debug!(
                "audio: alignment index {} past document end {} at {}ms",
                index, len, time_ms
            );
            return None;
        }
        (index != cursor).then_some(index)
    }
}
