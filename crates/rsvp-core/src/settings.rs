//! Reader configuration and persisted user settings.

use serde::{Deserialize, Serialize};

use crate::pacing::PacingFormula;

pub const MIN_WPM: u16 = 100;
pub const MAX_WPM: u16 = 1_000;
pub const DEFAULT_WPM: u16 = 300;
pub const WPM_STEP: u16 = 50;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReaderConfig {
    pub wpm: u16,
    pub min_wpm: u16,
    pub max_wpm: u16,
    pub wpm_step: u16,
    /// Extra pause after `. ! ? ; :`.
    pub sentence_pause_ms: u16,
    /// Extra pause after `,` when no sentence terminator is present.
    pub clause_pause_ms: u16,
    pub formula: PacingFormula,
    pub blink_poll_interval_ms: u64,
    /// Consecutive `closed` samples needed before an automatic pause fires.
    pub blink_close_samples: u8,
    /// Try speech synthesis on `Start`.
    pub speech_enabled: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            wpm: DEFAULT_WPM,
            min_wpm: MIN_WPM,
            max_wpm: MAX_WPM,
            wpm_step: WPM_STEP,
            sentence_pause_ms: 100,
            clause_pause_ms: 50,
            formula: PacingFormula::LengthAndPunctuation,
            blink_poll_interval_ms: 100,
            blink_close_samples: 1,
            speech_enabled: false,
        }
    }
}

impl ReaderConfig {
    pub fn clamp_wpm(&self, wpm: u16) -> u16 {
        wpm.clamp(self.min_wpm, self.max_wpm)
    }

    pub fn with_wpm(mut self, wpm: u16) -> Self {
        self.wpm = self.clamp_wpm(wpm);
        self
    }

    pub const fn with_speech(mut self, speech_enabled: bool) -> Self {
        self.speech_enabled = speech_enabled;
        self
    }
}

/// User-tunable settings that should survive a restart.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PersistedSettings {
    pub wpm: u16,
}

impl PersistedSettings {
    pub const fn new(wpm: u16) -> Self {
        Self { wpm }
    }
}

/// Abstract settings persistence backend.
pub trait SettingsStore {
    type Error;

    fn load(&mut self) -> Result<Option<PersistedSettings>, Self::Error>;
    fn save(&mut self, settings: &PersistedSettings) -> Result<(), Self::Error>;
}
