//! Fire-and-forget notifications about playback transitions.

use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryKind {
    FileUploaded,
    ReadingStarted,
    ReadingPaused,
    ReadingResumed,
    ReadingReset,
    ReadingFinished,
    WpmChanged,
    Navigated,
    ModeFallback,
}

impl TelemetryKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileUploaded => "file_uploaded",
            Self::ReadingStarted => "reading_started",
            Self::ReadingPaused => "reading_paused",
            Self::ReadingResumed => "reading_resumed",
            Self::ReadingReset => "reading_reset",
            Self::ReadingFinished => "reading_finished",
            Self::WpmChanged => "wpm_changed",
            Self::Navigated => "navigated",
            Self::ModeFallback => "mode_fallback",
        }
    }
}

/// Snapshot of session state attached to every notification. Serializes to the flat beacon
/// object.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct TelemetryEvent<'a> {
    #[serde(rename = "event_type")]
    pub kind: TelemetryKind,
    pub wpm: u16,
    pub current_word_index: usize,
    pub total_words: usize,
    pub file_name: Option<&'a str>,
    pub is_reading: bool,
    pub is_paused: bool,
    /// Set on [`TelemetryKind::WpmChanged`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_wpm: Option<u16>,
    /// Set on [`TelemetryKind::FileUploaded`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
}

/// Analytics beacon. Failures are logged by the session and otherwise ignored.
pub trait TelemetrySink {
    type Error: core::fmt::Debug;

    fn notify(&mut self, event: &TelemetryEvent<'_>) -> Result<(), Self::Error>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullTelemetry;

impl TelemetrySink for NullTelemetry {
    type Error = core::convert::Infallible;

    fn notify(&mut self, _event: &TelemetryEvent<'_>) -> Result<(), Self::Error> {
        Ok(())
    }
}
