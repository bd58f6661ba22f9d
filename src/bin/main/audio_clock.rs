use std::{cell::RefCell, collections::HashMap, rc::Rc};

use embassy_futures::select::{Either, select};
use embassy_time::{Instant, Timer};
use log::{debug, info, warn};
use rsvp_core::{
    audio::{AlignmentEntry, AlignmentTable, AudioHandle, SpeechService, Synthesis},
    content::WordSequence,
    input::Event,
    pacing,
    settings::ReaderConfig,
};

use super::{AudioControlQueue, EventQueue, commands::DriverEvent};

const AUDIO_TICK_MS: u64 = 50;
const MAX_SYNTH_WORDS: usize = 20_000;

/// Synthesized tracks waiting to be played, keyed by handle.
pub(super) type TrackStore = Rc<RefCell<HashMap<AudioHandle, u64>>>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum AudioControl {
    Start(AudioHandle),
    Pause(AudioHandle),
    Resume(AudioHandle),
    Stop(AudioHandle),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum SpeechError {
    EmptyText,
    TooLong { words: usize },
}

/// Offline stand-in for a TTS service: word timings follow the same pacing curve the
/// timer uses, so switching modes keeps the reading speed.
pub(super) struct SimulatedSpeech {
    config: ReaderConfig,
    tracks: TrackStore,
    next_handle: u32,
}

impl SimulatedSpeech {
    pub(super) fn new(config: ReaderConfig, tracks: TrackStore) -> Self {
        Self {
            config,
            tracks,
            next_handle: 1,
        }
    }
}

impl SpeechService for SimulatedSpeech {
    type Error = SpeechError;

    fn synthesize(&mut self, text: &str, wpm: u16) -> Result<Synthesis, Self::Error> {
        let words = WordSequence::from_text(text);
        if words.is_empty() {
            return Err(SpeechError::EmptyText);
        }
        if words.len() > MAX_SYNTH_WORDS {
            return Err(SpeechError::TooLong { words: words.len() });
        }

        let mut start_ms = 0u64;
        let alignment: AlignmentTable = words
            .iter()
            .enumerate()
            .map(|(index, word)| {
                let spoken_ms = pacing::delay_ms(word, wpm, &self.config).max(1);
                let entry = AlignmentEntry::new(index, start_ms, start_ms + spoken_ms - 1);
                start_ms += spoken_ms;
                entry
            })
            .collect();

        let handle = AudioHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.tracks
            .borrow_mut()
            .insert(handle, alignment.duration_ms() + 1);
        info!(
            "speech: synthesized track {} words={} duration_ms={}",
            handle.0,
            words.len(),
            alignment.duration_ms()
        );

        Ok(Synthesis { handle, alignment })
    }
}

struct Playback {
    handle: AudioHandle,
    duration_ms: u64,
    offset_ms: u64,
    resumed_at: Option<Instant>,
}

impl Playback {
    fn position_ms(&self) -> u64 {
        match self.resumed_at {
            Some(at) => self.offset_ms + at.elapsed().as_millis(),
            None => self.offset_ms,
        }
    }
}

/// Plays one track at a time, reporting the clock to the session every tick.
pub(super) async fn audio_clock_loop(
    tracks: TrackStore,
    control: &'static AudioControlQueue,
    queue: &'static EventQueue,
) -> ! {
    let mut playing: Option<Playback> = None;

    loop {
        let running = playing.as_ref().is_some_and(|p| p.resumed_at.is_some());
        let command = if running {
            match select(control.receive(), Timer::after_millis(AUDIO_TICK_MS)).await {
                Either::First(command) => Some(command),
                Either::Second(()) => None,
            }
        } else {
            Some(control.receive().await)
        };

        match command {
            Some(command) => apply(command, &mut playing, &tracks, queue),
            None => tick(&mut playing, &tracks, queue),
        }
    }
}

fn apply(
    command: AudioControl,
    playing: &mut Option<Playback>,
    tracks: &TrackStore,
    queue: &'static EventQueue,
) {
    debug!("audio: {:?}", command);
    match command {
        AudioControl::Start(handle) => {
            let Some(duration_ms) = tracks.borrow().get(&handle).copied() else {
                warn!("audio: no track for handle {}", handle.0);
                send(queue, Event::AudioStartFailed { handle });
                return;
            };
            *playing = Some(Playback {
                handle,
                duration_ms,
                offset_ms: 0,
                resumed_at: Some(Instant::now()),
            });
        }
        AudioControl::Pause(handle) => {
            if let Some(playback) = playing.as_mut().filter(|p| p.handle == handle) {
                playback.offset_ms = playback.position_ms();
                playback.resumed_at = None;
            }
        }
        AudioControl::Resume(handle) => {
            if let Some(playback) = playing.as_mut().filter(|p| p.handle == handle)
                && playback.resumed_at.is_none()
            {
                playback.resumed_at = Some(Instant::now());
            }
        }
        AudioControl::Stop(handle) => {
            tracks.borrow_mut().remove(&handle);
            if playing.as_ref().is_some_and(|p| p.handle == handle) {
                *playing = None;
            }
        }
    }
}

fn tick(playing: &mut Option<Playback>, tracks: &TrackStore, queue: &'static EventQueue) {
    let Some(playback) = playing.as_ref() else {
        return;
    };
    let handle = playback.handle;
    let time_ms = playback.position_ms();

    if time_ms >= playback.duration_ms {
        info!("audio: track {} ended at {}ms", handle.0, time_ms);
        *playing = None;
        tracks.borrow_mut().remove(&handle);
        send(queue, Event::AudioEnded { handle });
    } else {
        send(queue, Event::AudioTick { handle, time_ms });
    }
}

fn send(queue: &'static EventQueue, event: Event) {
    if queue.try_send(DriverEvent::Session(event)).is_err() {
        warn!("audio: event queue full; dropping clock event");
    }
}
