use std::{fs, path::Path};

use anyhow::Context;
use embassy_executor::Spawner;
use embassy_futures::select::{Either, select};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_time::{Duration, Instant, Timer};
use log::{debug, info, warn};
use rsvp_core::{
    input::{BlinkDebouncer, Command, Event},
    render::LocalRenderer,
    session::{Effect, Effects, PlaybackSession},
    settings::{PersistedSettings, SettingsStore},
    timer::TimerTicket,
};

use audio_clock::{AudioControl, SimulatedSpeech, TrackStore};
use blink_poll::FileBlinkClassifier;
use commands::DriverEvent;
use config::DriverConfig;
use display::LogTelemetry;
use settings_sync::{FileSettingsStore, SettingsSyncState};

#[path = "main/audio_clock.rs"]
mod audio_clock;
#[path = "main/blink_poll.rs"]
mod blink_poll;
#[path = "main/commands.rs"]
mod commands;
#[path = "main/config.rs"]
mod config;
#[path = "main/display.rs"]
mod display;
#[path = "main/settings_sync.rs"]
mod settings_sync;

const EVENT_QUEUE_DEPTH: usize = 32;
const AUDIO_CONTROL_DEPTH: usize = 8;
const SETTINGS_SAVE_DEBOUNCE_MS: u64 = 1_500;

type EventQueue = Channel<CriticalSectionRawMutex, DriverEvent, EVENT_QUEUE_DEPTH>;
type AudioControlQueue = Channel<CriticalSectionRawMutex, AudioControl, AUDIO_CONTROL_DEPTH>;
type Session = PlaybackSession<LocalRenderer, SimulatedSpeech, LogTelemetry>;

static EVENTS: EventQueue = Channel::new();
static AUDIO_CONTROL: AudioControlQueue = Channel::new();

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let started = Instant::now();
    let config = DriverConfig::from_env();

    let mut settings_store = FileSettingsStore::new(config.settings_path.clone());
    let persisted = match settings_store.load() {
        Ok(settings) => settings,
        Err(err) => {
            warn!("settings: load failed: {}; using defaults", err);
            None
        }
    };
    let wpm = config
        .wpm_override
        .or(persisted.map(|settings| settings.wpm))
        .unwrap_or(config.reader.wpm);
    let reader = config.reader.with_wpm(wpm);
    info!(
        "boot: wpm={} persisted={:?} speech={}",
        reader.wpm, persisted, reader.speech_enabled
    );

    let tracks = TrackStore::default();
    let mut session: Session = PlaybackSession::new(
        reader,
        LocalRenderer,
        SimulatedSpeech::new(reader, tracks.clone()),
        LogTelemetry,
    );
    let mut settings_sync = SettingsSyncState::new(PersistedSettings::new(
        persisted.map_or(session.wpm(), |settings| settings.wpm),
    ));
    let mut pending: Option<TimerTicket> = None;

    println!("{}", commands::HELP);
    match config.document.as_deref() {
        Some(path) => load_file(&mut session, path, 0, &mut pending),
        None => display::draw(&session.screen()),
    }

    commands::spawn_stdin_reader(&EVENTS);

    let blink_future = async {
        let classifier = match config.blink_file.clone() {
            Some(path) => match FileBlinkClassifier::spawn(path, reader.blink_poll_interval_ms) {
                Ok(classifier) => Some(classifier),
                Err(err) => {
                    warn!("blink: could not start sampler: {}; blink control disabled", err);
                    None
                }
            },
            None => {
                info!("blink: RSVP_BLINK_FILE not set; blink control disabled");
                None
            }
        };

        match classifier {
            Some(classifier) => {
                blink_poll::blink_poll_loop(
                    classifier,
                    BlinkDebouncer::new(reader.blink_close_samples),
                    reader.blink_poll_interval_ms,
                    &EVENTS,
                )
                .await
            }
            None => core::future::pending::<()>().await,
        }
    };

    let audio_future = audio_clock::audio_clock_loop(tracks, &AUDIO_CONTROL, &EVENTS);

    let ui_future = async {
        loop {
            let now_ms = started.elapsed().as_millis();
            settings_sync.track_current(PersistedSettings::new(session.wpm()), now_ms);
            settings_sync.flush_if_due(&mut settings_store, now_ms);

            let deadline_ms = match (pending.map(|ticket| ticket.due_ms), settings_sync.due_ms()) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            let next = match deadline_ms {
                Some(due_ms) => {
                    let deadline = started + Duration::from_millis(due_ms);
                    match select(EVENTS.receive(), Timer::at(deadline)).await {
                        Either::First(event) => Some(event),
                        Either::Second(()) => None,
                    }
                }
                None => Some(EVENTS.receive().await),
            };

            let now_ms = started.elapsed().as_millis();
            match next {
                None => {
                    if let Some(ticket) = pending.filter(|ticket| ticket.due_ms <= now_ms) {
                        pending = None;
                        dispatch(&mut session, Event::TimerFired(ticket), now_ms, &mut pending);
                    }
                }
                Some(DriverEvent::Session(event)) => {
                    dispatch(&mut session, event, now_ms, &mut pending)
                }
                Some(DriverEvent::LoadFile(path)) => {
                    load_file(&mut session, &path, now_ms, &mut pending)
                }
                Some(DriverEvent::Speech(enabled)) => {
                    session.set_speech_enabled(enabled);
                    println!(
                        "-- speech {} (applies on next start)",
                        if enabled { "on" } else { "off" }
                    );
                }
                Some(DriverEvent::Help) => println!("{}", commands::HELP),
                Some(DriverEvent::Quit) => {
                    settings_sync.track_current(PersistedSettings::new(session.wpm()), now_ms);
                    settings_sync.flush_now(&mut settings_store, now_ms);
                    info!(
                        "shutdown: word={}/{} state={}",
                        session.position(),
                        session.words().len(),
                        session.state().kind().as_str()
                    );
                    std::process::exit(0);
                }
            }
        }
    };

    let _ = embassy_futures::join::join3(blink_future, audio_future, ui_future).await;
}

fn dispatch(session: &mut Session, event: Event, now_ms: u64, pending: &mut Option<TimerTicket>) {
    let from_blink = matches!(event, Event::Blink(_));
    match session.handle(event, now_ms) {
        Ok(effects) => execute(effects, pending),
        Err(err) if err.is_user_visible() && !from_blink => display::message(&err),
        Err(err) => debug!("session: {:?} ignored", err),
    }
}

fn execute(effects: Effects, pending: &mut Option<TimerTicket>) {
    for effect in effects {
        match effect {
            Effect::Render(screen) => display::draw(&screen),
            Effect::ScheduleAdvance(ticket) => *pending = Some(ticket),
            Effect::CancelAdvance => *pending = None,
            Effect::StartAudio(handle) => audio_control(AudioControl::Start(handle)),
            Effect::PauseAudio(handle) => audio_control(AudioControl::Pause(handle)),
            Effect::ResumeAudio(handle) => audio_control(AudioControl::Resume(handle)),
            Effect::StopAudio(handle) => audio_control(AudioControl::Stop(handle)),
        }
    }
}

fn audio_control(command: AudioControl) {
    if AUDIO_CONTROL.try_send(command).is_err() {
        warn!("audio: control queue full; dropping {:?}", command);
    }
}

fn load_file(session: &mut Session, path: &Path, now_ms: u64, pending: &mut Option<TimerTicket>) {
    match read_document(path) {
        Ok(command) => dispatch(session, Event::Command(command), now_ms, pending),
        Err(err) => {
            warn!("load: {:#}", err);
            println!("! Could not open {}: {:#}", path.display(), err);
        }
    }
}

fn read_document(path: &Path) -> anyhow::Result<Command> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    info!("load: {} bytes from {}", text.len(), path.display());
    Ok(Command::Load { text, file_name })
}
