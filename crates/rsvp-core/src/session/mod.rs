//! Playback state machine: the single owner of the cursor and the arbiter of every
//! trigger source.

use alloc::string::String;

use heapless::Vec as HeaplessVec;
use log::{debug, info, warn};

use crate::{
    audio::{AudioAdvancer, AudioHandle, SpeechService},
    content::{DocumentInfo, WordSequence, is_separator, validate_document_name},
    cursor::WordCursor,
    error::PlaybackError,
    input::{BlinkEdge, Command, Event},
    pacing,
    render::{Screen, WordParts, WordRenderer, WordView},
    settings::ReaderConfig,
    telemetry::{TelemetryEvent, TelemetryKind, TelemetrySink},
    timer::{TimerAdvancer, TimerTicket},
};

const MAX_EFFECTS: usize = 6;

/// Work the driver must carry out after a handler returns.
pub type Effects = HeaplessVec<Effect, MAX_EFFECTS>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlaybackMode {
    Timer,
    AudioSynced,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PauseReason {
    Manual,
    /// Raised by the blink classifier.
    Automatic,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlaybackState {
    Idle,
    Reading(PlaybackMode),
    Paused {
        mode: PlaybackMode,
        reason: PauseReason,
    },
    Finished,
}

impl PlaybackState {
    pub const fn kind(self) -> StateKind {
        match self {
            Self::Idle => StateKind::Idle,
            Self::Reading(_) => StateKind::Reading,
            Self::Paused { .. } => StateKind::Paused,
            Self::Finished => StateKind::Finished,
        }
    }
}

/// Payload-free [`PlaybackState`], used in error reports.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StateKind {
    Idle,
    Reading,
    Paused,
    Finished,
}

impl StateKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Reading => "reading",
            Self::Paused => "paused",
            Self::Finished => "finished",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandKind {
    Start,
    TogglePause,
    PauseManual,
    PauseAutomatic,
    ResumeManual,
    ResumeAutomatic,
    Reset,
    JumpTo,
    SearchNext,
    SetRate,
    Load,
}

impl CommandKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::TogglePause => "toggle pause",
            Self::PauseManual => "pause",
            Self::PauseAutomatic => "auto-pause",
            Self::ResumeManual => "resume",
            Self::ResumeAutomatic => "auto-resume",
            Self::Reset => "reset",
            Self::JumpTo => "jump",
            Self::SearchNext => "search",
            Self::SetRate => "change speed",
            Self::Load => "load",
        }
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Start => CommandKind::Start,
            Self::TogglePause => CommandKind::TogglePause,
            Self::PauseManual => CommandKind::PauseManual,
            Self::ResumeManual => CommandKind::ResumeManual,
            Self::Reset => CommandKind::Reset,
            Self::JumpTo(_) => CommandKind::JumpTo,
            Self::SearchNext(_) => CommandKind::SearchNext,
            Self::SetRate(_) | Self::StepRate { .. } => CommandKind::SetRate,
            Self::Load { .. } => CommandKind::Load,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Effect {
    Render(Screen),
    ScheduleAdvance(TimerTicket),
    /// Drop the pending advance; its ticket is already dead.
    CancelAdvance,
    StartAudio(AudioHandle),
    PauseAudio(AudioHandle),
    ResumeAudio(AudioHandle),
    StopAudio(AudioHandle),
}

pub struct PlaybackSession<RN, SP, TS>
where
    RN: WordRenderer,
    SP: SpeechService,
    TS: TelemetrySink,
{
    config: ReaderConfig,
    wpm: u16,
    cursor: WordCursor,
    document: DocumentInfo,
    state: PlaybackState,
    timer: TimerAdvancer,
    audio: Option<AudioAdvancer>,
    renderer: RN,
    speech: SP,
    telemetry: TS,
}

include!("transitions.rs");
include!("navigation.rs");
include!("runtime.rs");

impl<RN, SP, TS> PlaybackSession<RN, SP, TS>
where
    RN: WordRenderer,
    SP: SpeechService,
    TS: TelemetrySink,
{
    pub fn new(config: ReaderConfig, renderer: RN, speech: SP, telemetry: TS) -> Self {
        Self {
            wpm: config.clamp_wpm(config.wpm),
            config,
            cursor: WordCursor::default(),
            document: DocumentInfo::default(),
            state: PlaybackState::Idle,
            timer: TimerAdvancer::new(),
            audio: None,
            renderer,
            speech,
            telemetry,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn current_word(&self) -> Option<&str> {
        self.cursor.current()
    }

    pub fn words(&self) -> &WordSequence {
        self.cursor.words()
    }

    pub fn document(&self) -> &DocumentInfo {
        &self.document
    }

    pub fn wpm(&self) -> u16 {
        self.wpm
    }

    pub fn set_speech_enabled(&mut self, enabled: bool) {
        self.config.speech_enabled = enabled;
    }

    pub fn pending_advance(&self) -> Option<TimerTicket> {
        self.timer.pending()
    }

    pub fn active_audio(&self) -> Option<AudioHandle> {
        self.audio.as_ref().map(AudioAdvancer::handle)
    }

    /// Serialize one trigger into a state transition. Errors leave the session unchanged.
    pub fn handle(&mut self, event: Event, now_ms: u64) -> Result<Effects, PlaybackError> {
        match event {
            Event::Command(command) => self.apply_command(command, now_ms),
            Event::TimerFired(ticket) => Ok(self.on_timer_fired(ticket, now_ms)),
            Event::AudioTick { handle, time_ms } => Ok(self.on_audio_tick(handle, time_ms)),
            Event::AudioEnded { handle } => Ok(self.on_audio_ended(handle)),
            Event::AudioStartFailed { handle } => Ok(self.on_audio_start_failed(handle, now_ms)),
            Event::Blink(BlinkEdge::EyesClosed) => self.pause_automatic(),
            Event::Blink(BlinkEdge::EyesOpened) => self.resume_automatic(now_ms),
        }
    }

    pub fn apply_command(
        &mut self,
        command: Command,
        now_ms: u64,
    ) -> Result<Effects, PlaybackError> {
        if self.state == PlaybackState::Idle
            && self.cursor.is_empty()
            && !matches!(command, Command::Start | Command::Reset | Command::Load { .. })
        {
            return Err(self.invalid(command.kind()));
        }

        match command {
            Command::Start => self.start(now_ms),
            Command::TogglePause => self.toggle_pause(now_ms),
            Command::PauseManual => self.pause_manual(),
            Command::ResumeManual => self.resume_manual(now_ms),
            Command::Reset => Ok(self.reset()),
            Command::JumpTo(index) => self.jump_to(index, now_ms),
            Command::SearchNext(term) => self.search_next(&term, now_ms),
            Command::SetRate(wpm) => Ok(self.set_rate(wpm)),
            Command::StepRate { increase } => Ok(self.step_rate(increase)),
            Command::Load { text, file_name } => self.load(&text, file_name),
        }
    }

    /// What the display should show right now.
    pub fn screen(&mut self) -> Screen {
        match self.state {
            PlaybackState::Idle => Screen::Ready {
                total_words: self.cursor.len(),
                wpm: self.wpm,
            },
            PlaybackState::Finished => Screen::Finished {
                total_words: self.cursor.len(),
            },
            PlaybackState::Reading(_) | PlaybackState::Paused { .. } => self.word_screen(),
        }
    }

    fn word_screen(&mut self) -> Screen {
        let Some(word) = self.cursor.current() else {
            return Screen::Finished {
                total_words: self.cursor.len(),
            };
        };

        let parts = match self.renderer.decompose(word) {
            Ok(parts) => parts,
            Err(err) => {
                warn!("session: renderer failed, using local split: {:?}", err);
                WordParts::fallback(word)
            }
        };

        Screen::Word(WordView {
            index: self.cursor.position(),
            total: self.cursor.len(),
            wpm: self.wpm,
            progress_pct: self.cursor.progress_pct(),
            parts,
        })
    }

    fn render(&mut self, effects: &mut Effects) {
        let screen = self.screen();
        push(effects, Effect::Render(screen));
    }

    /// Show the current word and schedule its advance. Finishes instead when the cursor
    /// is already past the last word.
    fn show_and_schedule(&mut self, now_ms: u64, effects: &mut Effects) {
        let Some(word) = self.cursor.current() else {
            self.finish(effects);
            return;
        };
        let delay_ms = pacing::delay_ms(word, self.wpm, &self.config);

        self.render(effects);
        let ticket = self.timer.schedule(now_ms, delay_ms);
        debug!(
            "session: scheduled advance index={} delay_ms={} generation={}",
            self.cursor.position(),
            delay_ms,
            ticket.generation
        );
        push(effects, Effect::ScheduleAdvance(ticket));
    }

    /// Drop the pending advance and any live audio track.
    fn halt(&mut self, effects: &mut Effects) {
        if self.timer.cancel() {
            push(effects, Effect::CancelAdvance);
        }
        if let Some(audio) = self.audio.take() {
            push(effects, Effect::StopAudio(audio.handle()));
        }
    }

    fn invalid(&self, command: CommandKind) -> PlaybackError {
        debug!(
            "session: rejected {} while {:?}",
            command.as_str(),
            self.state
        );
        PlaybackError::InvalidTransition {
            from: self.state.kind(),
            command,
        }
    }

    fn emit(&mut self, kind: TelemetryKind) {
        self.notify(kind, None, None);
    }

    fn notify(&mut self, kind: TelemetryKind, new_wpm: Option<u16>, word_count: Option<usize>) {
        let event = TelemetryEvent {
            kind,
            wpm: self.wpm,
            current_word_index: self.cursor.position(),
            total_words: self.cursor.len(),
            file_name: self.document.file_name.as_deref(),
            is_reading: matches!(self.state, PlaybackState::Reading(_)),
            is_paused: matches!(self.state, PlaybackState::Paused { .. }),
            new_wpm,
            word_count,
        };

        if let Err(err) = self.telemetry.notify(&event) {
            warn!("session: telemetry {} dropped: {:?}", kind.as_str(), err);
        }
    }
}

fn push(effects: &mut Effects, effect: Effect) {
    if effects.push(effect).is_err() {
        warn!("session: effect queue full");
    }
}

#[cfg(test)]
mod tests;
