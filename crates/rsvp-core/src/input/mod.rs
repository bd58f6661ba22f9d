//! Trigger sources feeding the playback session.

use alloc::string::String;

use crate::{audio::AudioHandle, timer::TimerTicket};

pub mod blink;

pub use blink::{BlinkClassifier, BlinkDebouncer, BlinkEdge, BlinkState};

/// User-issued commands.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Start,
    /// Pause when reading, resume when paused.
    TogglePause,
    PauseManual,
    ResumeManual,
    Reset,
    JumpTo(usize),
    SearchNext(String),
    SetRate(u16),
    StepRate { increase: bool },
    Load {
        text: String,
        file_name: Option<String>,
    },
}

/// One entry of the session's event queue.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    Command(Command),
    TimerFired(TimerTicket),
    AudioTick { handle: AudioHandle, time_ms: u64 },
    AudioEnded { handle: AudioHandle },
    /// The audio element refused to start playing.
    AudioStartFailed { handle: AudioHandle },
    Blink(BlinkEdge),
}

impl From<Command> for Event {
    fn from(command: Command) -> Self {
        Self::Command(command)
    }
}

/// Keys understood by the reading surface.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Key {
    Space,
    Enter,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Char(char),
}

/// Keyboard shortcuts: space pauses/resumes, enter starts, arrows change speed, `r` resets.
pub fn command_for_key(key: Key) -> Option<Command> {
    match key {
        Key::Space => Some(Command::TogglePause),
        Key::Enter => Some(Command::Start),
        Key::ArrowUp | Key::ArrowRight => Some(Command::StepRate { increase: true }),
        Key::ArrowDown | Key::ArrowLeft => Some(Command::StepRate { increase: false }),
        Key::Char('r') | Key::Char('R') => Some(Command::Reset),
        Key::Char(_) => None,
    }
}
