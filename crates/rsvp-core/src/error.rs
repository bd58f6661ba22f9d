//! Error taxonomy shared by the session and its collaborators.

use core::fmt;

use crate::session::{CommandKind, StateKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlaybackError {
    /// `Start` with no words loaded.
    EmptyDocument,
    /// Cursor target outside the loaded sequence.
    OutOfRange { index: usize, len: usize },
    /// Search term is blank or spans more than one token.
    InvalidSearchTerm,
    NotFound,
    SynthesisFailure,
    /// Renderer, telemetry, or blink classifier unreachable.
    TransportFailure,
    /// Command not allowed from the current state. The state is left untouched.
    InvalidTransition { from: StateKind, command: CommandKind },
    /// Only `.txt` and `.md` documents are accepted.
    UnsupportedDocument,
}

impl PlaybackError {
    /// Whether the failure should be shown to the reader. Degraded-mode and transport
    /// failures are absorbed by the session.
    pub const fn is_user_visible(self) -> bool {
        matches!(
            self,
            Self::EmptyDocument
                | Self::OutOfRange { .. }
                | Self::InvalidSearchTerm
                | Self::NotFound
                | Self::UnsupportedDocument
        )
    }
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDocument => f.write_str("Please upload a file first"),
            Self::OutOfRange { index, len } => {
                write!(f, "Word {} is out of range (document has {} words)", index, len)
            }
            Self::InvalidSearchTerm => f.write_str("Search for a single word"),
            Self::NotFound => f.write_str("No matching word found"),
            Self::SynthesisFailure => f.write_str("Speech unavailable; reading without audio"),
            Self::TransportFailure => f.write_str("Service unreachable"),
            Self::InvalidTransition { from, command } => {
                write!(f, "Cannot {} while {}", command.as_str(), from.as_str())
            }
            Self::UnsupportedDocument => f.write_str("Please upload a .txt or .md file"),
        }
    }
}
