use alloc::{rc::Rc, string::ToString, vec, vec::Vec};
use core::cell::RefCell;

use super::*;
use crate::{
    audio::{AlignmentEntry, AlignmentTable, NoSpeech, Synthesis},
    input::BlinkEdge,
    render::LocalRenderer,
};

#[derive(Clone, Default)]
struct RecordingTelemetry {
    events: Rc<RefCell<Vec<(TelemetryKind, Option<u16>)>>>,
    fail: bool,
}

impl RecordingTelemetry {
    fn kinds(&self) -> Vec<TelemetryKind> {
        self.events.borrow().iter().map(|(kind, _)| *kind).collect()
    }
}

impl TelemetrySink for RecordingTelemetry {
    type Error = &'static str;

    fn notify(&mut self, event: &TelemetryEvent<'_>) -> Result<(), Self::Error> {
        self.events.borrow_mut().push((event.kind, event.new_wpm));
        if self.fail { Err("beacon offline") } else { Ok(()) }
    }
}

struct ScriptedSpeech {
    result: Option<Vec<AlignmentEntry>>,
}

impl SpeechService for ScriptedSpeech {
    type Error = &'static str;

    fn synthesize(&mut self, _text: &str, _wpm: u16) -> Result<Synthesis, Self::Error> {
        match &self.result {
            Some(entries) => Ok(Synthesis {
                handle: AudioHandle(7),
                alignment: AlignmentTable::new(entries.clone()),
            }),
            None => Err("tts offline"),
        }
    }
}

struct OfflineRenderer;

impl WordRenderer for OfflineRenderer {
    type Error = &'static str;

    fn decompose(&mut self, _word: &str) -> Result<WordParts, Self::Error> {
        Err("renderer offline")
    }
}

type TimerSession = PlaybackSession<LocalRenderer, NoSpeech, RecordingTelemetry>;
type AudioSession = PlaybackSession<LocalRenderer, ScriptedSpeech, RecordingTelemetry>;

const FOUR_WORDS: &str = "The quick fox jumps.";

fn timer_session(text: &str) -> (TimerSession, RecordingTelemetry) {
    let telemetry = RecordingTelemetry::default();
    let mut session = PlaybackSession::new(
        ReaderConfig::default(),
        LocalRenderer,
        NoSpeech,
        telemetry.clone(),
    );
    session.load(text, None).unwrap();
    (session, telemetry)
}

fn audio_session(result: Option<Vec<AlignmentEntry>>) -> (AudioSession, RecordingTelemetry) {
    let telemetry = RecordingTelemetry::default();
    let mut session = PlaybackSession::new(
        ReaderConfig::default().with_speech(true),
        LocalRenderer,
        ScriptedSpeech { result },
        telemetry.clone(),
    );
    session.load(FOUR_WORDS, Some("fox.txt".to_string())).unwrap();
    (session, telemetry)
}

fn scheduled(effects: &Effects) -> Option<TimerTicket> {
    effects.iter().find_map(|effect| match effect {
        Effect::ScheduleAdvance(ticket) => Some(*ticket),
        _ => None,
    })
}

fn rendered(effects: &Effects) -> Option<&Screen> {
    effects.iter().find_map(|effect| match effect {
        Effect::Render(screen) => Some(screen),
        _ => None,
    })
}

const PAUSED_MANUAL: PlaybackState = PlaybackState::Paused {
    mode: PlaybackMode::Timer,
    reason: PauseReason::Manual,
};

const PAUSED_AUTOMATIC: PlaybackState = PlaybackState::Paused {
    mode: PlaybackMode::Timer,
    reason: PauseReason::Automatic,
};

const READING_TIMER: PlaybackState = PlaybackState::Reading(PlaybackMode::Timer);

#[test]
fn start_without_document_is_rejected() {
    let mut session = PlaybackSession::new(
        ReaderConfig::default(),
        LocalRenderer,
        NoSpeech,
        RecordingTelemetry::default(),
    );
    assert_eq!(session.start(0), Err(PlaybackError::EmptyDocument));
    assert_eq!(session.state(), PlaybackState::Idle);

    let (mut blank, _) = timer_session("  \u{2014} ");
    assert_eq!(
        blank.apply_command(Command::Start, 0),
        Err(PlaybackError::EmptyDocument)
    );
}

#[test]
fn start_shows_first_word_and_schedules_its_delay() {
    let (mut session, telemetry) = timer_session(FOUR_WORDS);
    let effects = session.start(1_000).unwrap();

    assert_eq!(session.state(), READING_TIMER);
    let ticket = scheduled(&effects).unwrap();
    // "The" at 300 wpm: 200 + 9 * 0.2 = 201.8
    assert_eq!(ticket.delay_ms, 202);
    assert_eq!(ticket.due_ms, 1_202);
    match rendered(&effects) {
        Some(Screen::Word(view)) => {
            assert_eq!(view.index, 0);
            assert_eq!(view.total, 4);
            assert_eq!(view.parts.focal, "h");
        }
        other => panic!("unexpected screen {other:?}"),
    }
    assert_eq!(
        telemetry.kinds(),
        [TelemetryKind::FileUploaded, TelemetryKind::ReadingStarted]
    );
}

#[test]
fn n_timer_firings_finish_and_extra_firing_is_ignored() {
    let (mut session, telemetry) = timer_session(FOUR_WORDS);
    let mut ticket = scheduled(&session.start(0).unwrap()).unwrap();

    for fired in 1..=4 {
        let effects = session.on_timer_fired(ticket, ticket.due_ms);
        if fired < 4 {
            assert_eq!(session.position(), fired);
            ticket = scheduled(&effects).unwrap();
        } else {
            assert_eq!(session.state(), PlaybackState::Finished);
            assert_eq!(scheduled(&effects), None);
            assert_eq!(
                rendered(&effects),
                Some(&Screen::Finished { total_words: 4 })
            );
        }
    }

    let effects = session.on_timer_fired(ticket, ticket.due_ms + 1_000);
    assert!(effects.is_empty());
    assert_eq!(session.position(), 4);
    assert_eq!(session.state(), PlaybackState::Finished);
    assert_eq!(telemetry.kinds().last(), Some(&TelemetryKind::ReadingFinished));
}

#[test]
fn cancelled_ticket_never_advances_after_pause_or_reset() {
    let (mut session, _) = timer_session(FOUR_WORDS);
    let first = scheduled(&session.start(0).unwrap()).unwrap();

    let effects = session.pause_manual().unwrap();
    assert!(effects.contains(&Effect::CancelAdvance));
    assert!(session.on_timer_fired(first, first.due_ms).is_empty());
    assert_eq!(session.position(), 0);

    let second = scheduled(&session.resume_manual(500).unwrap()).unwrap();
    assert!(session.on_timer_fired(first, 800).is_empty());
    assert_eq!(session.position(), 0);

    session.reset();
    assert!(session.on_timer_fired(second, second.due_ms).is_empty());
    assert_eq!(session.position(), 0);
    assert_eq!(session.state(), PlaybackState::Idle);
    assert_eq!(session.pending_advance(), None);
}

#[test]
fn eyes_open_never_clears_a_manual_pause() {
    let (mut session, _) = timer_session(FOUR_WORDS);
    session.start(0).unwrap();
    session.pause_manual().unwrap();

    let result = session.handle(Event::Blink(BlinkEdge::EyesOpened), 100);
    assert_eq!(
        result,
        Err(PlaybackError::InvalidTransition {
            from: StateKind::Paused,
            command: CommandKind::ResumeAutomatic,
        })
    );
    assert_eq!(session.state(), PAUSED_MANUAL);
    assert_eq!(session.pending_advance(), None);
}

#[test]
fn eyes_closed_does_not_relabel_a_manual_pause() {
    let (mut session, _) = timer_session(FOUR_WORDS);
    session.start(0).unwrap();
    session.pause_manual().unwrap();

    assert!(session.handle(Event::Blink(BlinkEdge::EyesClosed), 50).is_err());
    assert!(session.handle(Event::Blink(BlinkEdge::EyesOpened), 60).is_err());
    assert_eq!(session.state(), PAUSED_MANUAL);

    session.resume_manual(70).unwrap();
    assert_eq!(session.state(), READING_TIMER);
}

#[test]
fn blink_pause_round_trip_and_manual_override() {
    let (mut session, _) = timer_session(FOUR_WORDS);
    session.start(0).unwrap();

    session.handle(Event::Blink(BlinkEdge::EyesClosed), 10).unwrap();
    assert_eq!(session.state(), PAUSED_AUTOMATIC);
    session.handle(Event::Blink(BlinkEdge::EyesOpened), 20).unwrap();
    assert_eq!(session.state(), READING_TIMER);
    assert!(session.pending_advance().is_some());

    session.handle(Event::Blink(BlinkEdge::EyesClosed), 30).unwrap();
    session.apply_command(Command::ResumeManual, 40).unwrap();
    assert_eq!(session.state(), READING_TIMER);
}

#[derive(Clone, Copy, Debug)]
enum PauseTrigger {
    PauseManual,
    PauseAutomatic,
    ResumeManual,
    ResumeAutomatic,
}

fn apply_trigger(session: &mut TimerSession, trigger: PauseTrigger, now_ms: u64) {
    let _ = match trigger {
        PauseTrigger::PauseManual => session.apply_command(Command::PauseManual, now_ms),
        PauseTrigger::PauseAutomatic => session.handle(Event::Blink(BlinkEdge::EyesClosed), now_ms),
        PauseTrigger::ResumeManual => session.apply_command(Command::ResumeManual, now_ms),
        PauseTrigger::ResumeAutomatic => session.handle(Event::Blink(BlinkEdge::EyesOpened), now_ms),
    };
}

#[test]
fn pause_reason_isolation_holds_for_all_interleavings() {
    const TRIGGERS: [PauseTrigger; 4] = [
        PauseTrigger::PauseManual,
        PauseTrigger::PauseAutomatic,
        PauseTrigger::ResumeManual,
        PauseTrigger::ResumeAutomatic,
    ];
    const STEPS: u32 = 5;

    for seed in 0..TRIGGERS.len().pow(STEPS) {
        let (mut session, _) = timer_session(FOUR_WORDS);
        session.start(0).unwrap();

        let mut code = seed;
        for step in 0..STEPS {
            let trigger = TRIGGERS[code % TRIGGERS.len()];
            code /= TRIGGERS.len();
            let before = session.state();
            apply_trigger(&mut session, trigger, step as u64);
            let after = session.state();

            if before == PAUSED_MANUAL
                && matches!(
                    trigger,
                    PauseTrigger::ResumeAutomatic | PauseTrigger::PauseAutomatic
                )
            {
                assert_eq!(after, before, "seed={seed} step={step} {trigger:?}");
            }
            let reading = after == READING_TIMER;
            assert_eq!(session.pending_advance().is_some(), reading, "seed={seed}");
        }
    }
}

#[test]
fn search_wraps_to_earlier_match() {
    let (mut session, _) = timer_session("alpha beta Foo, gamma delta");
    session.start(0).unwrap();
    session.jump_to(4, 10).unwrap();

    session.search_next("foo", 20).unwrap();
    assert_eq!(session.position(), 2);
    assert_eq!(session.state(), READING_TIMER);
}

#[test]
fn search_includes_current_word_only_after_wrapping() {
    let (mut session, _) = timer_session("foo bar foo baz");
    session.start(0).unwrap();

    session.search_next("FOO", 0).unwrap();
    assert_eq!(session.position(), 2);
    session.search_next("foo", 0).unwrap();
    assert_eq!(session.position(), 0);
    session.search_next("bar", 0).unwrap();
    session.search_next("bar", 0).unwrap();
    assert_eq!(session.position(), 1);
}

#[test]
fn failed_search_leaves_cursor_and_timer_alone() {
    let (mut session, _) = timer_session(FOUR_WORDS);
    session.start(0).unwrap();
    session.jump_to(3, 0).unwrap();
    let pending = session.pending_advance();

    assert_eq!(session.search_next("zzz", 5), Err(PlaybackError::NotFound));
    assert_eq!(
        session.search_next("quick fox", 5),
        Err(PlaybackError::InvalidSearchTerm)
    );
    assert_eq!(
        session.search_next("   ", 5),
        Err(PlaybackError::InvalidSearchTerm)
    );
    assert_eq!(session.position(), 3);
    assert_eq!(session.pending_advance(), pending);
    assert_eq!(session.state(), READING_TIMER);
}

#[test]
fn dashed_terms_are_rejected_like_multi_word_terms() {
    let (mut session, _) = timer_session("a well-known fact");
    session.start(0).unwrap();

    for term in ["well-known", "well\u{2014}known", "-"] {
        assert_eq!(
            session.search_next(term, 5),
            Err(PlaybackError::InvalidSearchTerm)
        );
    }
    assert_eq!(session.position(), 0);
    assert_eq!(session.search_next("known", 5).map(|_| ()), Ok(()));
    assert_eq!(session.position(), 2);
}

#[test]
fn jump_reschedules_timer_from_new_word() {
    let (mut session, _) = timer_session(FOUR_WORDS);
    let old = scheduled(&session.start(0).unwrap()).unwrap();

    let effects = session.jump_to(3, 100).unwrap();
    assert_eq!(effects[0], Effect::CancelAdvance);
    let fresh = scheduled(&effects).unwrap();
    assert_eq!(fresh.due_ms, 100 + 307);
    assert!(session.on_timer_fired(old, old.due_ms).is_empty());
    assert_eq!(session.position(), 3);

    session.on_timer_fired(fresh, fresh.due_ms);
    assert_eq!(session.state(), PlaybackState::Finished);
}

#[test]
fn jump_validates_range_and_state() {
    let (mut session, _) = timer_session(FOUR_WORDS);
    assert_eq!(
        session.jump_to(1, 0),
        Err(PlaybackError::InvalidTransition {
            from: StateKind::Idle,
            command: CommandKind::JumpTo,
        })
    );

    session.start(0).unwrap();
    assert_eq!(
        session.jump_to(4, 0),
        Err(PlaybackError::OutOfRange { index: 4, len: 4 })
    );
    assert_eq!(session.position(), 0);
}

#[test]
fn jump_while_paused_keeps_the_pause() {
    let (mut session, _) = timer_session(FOUR_WORDS);
    session.start(0).unwrap();
    session.pause_manual().unwrap();

    let effects = session.jump_to(2, 0).unwrap();
    assert_eq!(scheduled(&effects), None);
    assert_eq!(session.state(), PAUSED_MANUAL);
    assert_eq!(session.current_word(), Some("fox"));
}

#[test]
fn jump_after_finish_pauses_on_timer() {
    let (mut session, _) = timer_session("one two");
    let ticket = scheduled(&session.start(0).unwrap()).unwrap();
    let ticket = scheduled(&session.on_timer_fired(ticket, 10)).unwrap();
    session.on_timer_fired(ticket, 20);
    assert_eq!(session.state(), PlaybackState::Finished);

    session.jump_to(0, 30).unwrap();
    assert_eq!(session.state(), PAUSED_MANUAL);
    assert!(scheduled(&session.resume_manual(40).unwrap()).is_some());
}

#[test]
fn audio_tick_jumps_straight_to_aligned_word() {
    let (mut session, _) = audio_session(Some(vec![AlignmentEntry::new(2, 500, 900)]));
    let effects = session.start(0).unwrap();
    assert_eq!(
        session.state(),
        PlaybackState::Reading(PlaybackMode::AudioSynced)
    );
    assert!(effects.contains(&Effect::StartAudio(AudioHandle(7))));
    assert_eq!(scheduled(&effects), None);

    let effects = session.on_audio_tick(AudioHandle(7), 650);
    assert_eq!(session.position(), 2);
    assert!(rendered(&effects).is_some());

    assert!(session.on_audio_tick(AudioHandle(7), 1_200).is_empty());
    assert_eq!(session.position(), 2);
}

#[test]
fn audio_ticks_from_other_tracks_or_while_paused_are_ignored() {
    let (mut session, _) = audio_session(Some(vec![AlignmentEntry::new(1, 0, 100)]));
    session.start(0).unwrap();

    assert!(session.on_audio_tick(AudioHandle(99), 50).is_empty());
    let effects = session.pause_manual().unwrap();
    assert!(effects.contains(&Effect::PauseAudio(AudioHandle(7))));
    assert!(session.on_audio_tick(AudioHandle(7), 50).is_empty());
    assert_eq!(session.position(), 0);

    let effects = session.resume_manual(0).unwrap();
    assert!(effects.contains(&Effect::ResumeAudio(AudioHandle(7))));
}

#[test]
fn navigation_in_audio_mode_does_not_touch_the_clock() {
    let (mut session, _) = audio_session(Some(vec![AlignmentEntry::new(0, 0, 100)]));
    session.start(0).unwrap();

    let effects = session.jump_to(3, 10).unwrap();
    assert_eq!(effects.len(), 1);
    assert!(rendered(&effects).is_some());
    assert_eq!(session.pending_advance(), None);

    session.on_audio_tick(AudioHandle(7), 20);
    assert_eq!(session.position(), 0);
}

#[test]
fn audio_end_finishes_regardless_of_cursor() {
    let (mut session, telemetry) = audio_session(Some(vec![AlignmentEntry::new(0, 0, 100)]));
    session.start(0).unwrap();

    assert!(session.on_audio_ended(AudioHandle(3)).is_empty());
    let effects = session.on_audio_ended(AudioHandle(7));
    assert_eq!(session.state(), PlaybackState::Finished);
    assert_eq!(session.position(), 0);
    assert!(effects.contains(&Effect::Render(Screen::Finished { total_words: 4 })));
    assert_eq!(session.active_audio(), None);
    assert_eq!(telemetry.kinds().last(), Some(&TelemetryKind::ReadingFinished));
}

#[test]
fn synthesis_failure_degrades_to_timer() {
    let (mut session, telemetry) = audio_session(None);
    let effects = session.start(0).unwrap();

    assert_eq!(session.state(), READING_TIMER);
    assert!(scheduled(&effects).is_some());
    assert!(telemetry.kinds().contains(&TelemetryKind::ModeFallback));
}

#[test]
fn empty_alignment_counts_as_synthesis_failure() {
    let (mut session, _) = audio_session(Some(Vec::new()));
    session.start(0).unwrap();
    assert_eq!(session.state(), READING_TIMER);
}

#[test]
fn audio_start_failure_resumes_on_timer_from_cursor() {
    let (mut session, telemetry) = audio_session(Some(vec![AlignmentEntry::new(1, 0, 100)]));
    session.start(0).unwrap();
    session.on_audio_tick(AudioHandle(7), 50);

    let effects = session.handle(Event::AudioStartFailed { handle: AudioHandle(7) }, 60).unwrap();
    assert_eq!(session.state(), READING_TIMER);
    assert_eq!(session.position(), 1);
    // "quick" at 300 wpm: 200 + 25 * 0.2 = 205
    assert_eq!(scheduled(&effects).map(|t| t.due_ms), Some(60 + 205));
    assert_eq!(session.active_audio(), None);
    assert_eq!(telemetry.kinds().last(), Some(&TelemetryKind::ModeFallback));
}

#[test]
fn collaborator_failures_are_absorbed() {
    let telemetry = RecordingTelemetry {
        fail: true,
        ..RecordingTelemetry::default()
    };
    let mut session = PlaybackSession::new(
        ReaderConfig::default(),
        OfflineRenderer,
        NoSpeech,
        telemetry.clone(),
    );
    session.load("hello world", None).unwrap();

    let effects = session.start(0).unwrap();
    match rendered(&effects) {
        Some(Screen::Word(view)) => assert_eq!(view.parts, WordParts::fallback("hello")),
        other => panic!("unexpected screen {other:?}"),
    }
    assert_eq!(session.state(), READING_TIMER);
    assert_eq!(telemetry.kinds().len(), 2);
}

#[test]
fn idle_without_document_ignores_commands() {
    let mut session = PlaybackSession::new(
        ReaderConfig::default(),
        LocalRenderer,
        NoSpeech,
        RecordingTelemetry::default(),
    );
    for command in [
        Command::PauseManual,
        Command::ResumeManual,
        Command::TogglePause,
        Command::JumpTo(0),
        Command::SearchNext("a".to_string()),
        Command::SetRate(500),
    ] {
        assert!(matches!(
            session.apply_command(command, 0),
            Err(PlaybackError::InvalidTransition { from: StateKind::Idle, .. })
        ));
    }
    assert_eq!(session.wpm(), 300);
    assert!(session.apply_command(Command::Reset, 0).is_ok());
    assert_eq!(session.state(), PlaybackState::Idle);
}

#[test]
fn reset_returns_to_idle_from_reading() {
    let (mut session, _) = timer_session(FOUR_WORDS);
    let ticket = scheduled(&session.start(0).unwrap()).unwrap();
    session.on_timer_fired(ticket, ticket.due_ms);

    let effects = session.reset();
    assert_eq!(effects[0], Effect::CancelAdvance);
    assert_eq!(
        rendered(&effects),
        Some(&Screen::Ready {
            total_words: 4,
            wpm: 300
        })
    );
    assert_eq!(session.position(), 0);
    assert_eq!(session.state(), PlaybackState::Idle);
}

#[test]
fn toggle_pause_follows_the_space_bar() {
    let (mut session, _) = timer_session(FOUR_WORDS);
    assert!(session.apply_command(Command::TogglePause, 0).is_err());
    session.apply_command(Command::Start, 0).unwrap();

    session.apply_command(Command::TogglePause, 10).unwrap();
    assert_eq!(session.state(), PAUSED_MANUAL);
    session.apply_command(Command::TogglePause, 20).unwrap();
    assert_eq!(session.state(), READING_TIMER);
}

#[test]
fn rate_changes_are_clamped_and_reported() {
    let (mut session, telemetry) = timer_session(FOUR_WORDS);

    session.apply_command(Command::StepRate { increase: true }, 0).unwrap();
    assert_eq!(session.wpm(), 350);
    session.apply_command(Command::SetRate(5_000), 0).unwrap();
    assert_eq!(session.wpm(), 1_000);
    session.apply_command(Command::StepRate { increase: true }, 0).unwrap();
    session.apply_command(Command::SetRate(1), 0).unwrap();
    assert_eq!(session.wpm(), 100);

    let changes: Vec<Option<u16>> = telemetry
        .events
        .borrow()
        .iter()
        .filter(|(kind, _)| *kind == TelemetryKind::WpmChanged)
        .map(|(_, wpm)| *wpm)
        .collect();
    assert_eq!(changes, [Some(350), Some(1_000), Some(100)]);
}

#[test]
fn new_rate_applies_from_the_next_word() {
    let (mut session, _) = timer_session(FOUR_WORDS);
    let ticket = scheduled(&session.start(0).unwrap()).unwrap();

    let effects = session.set_rate(600);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Render(Screen::Word(view))] if view.wpm == 600 && view.index == 0
    ));
    assert_eq!(session.pending_advance(), Some(ticket));
    let next = scheduled(&session.on_timer_fired(ticket, ticket.due_ms)).unwrap();
    // "quick" at 600 wpm: 100 + 25 * 0.1 = 102.5
    assert_eq!(next.delay_ms, 103);
}

#[test]
fn load_rejects_unsupported_files_without_side_effects() {
    let (mut session, _) = timer_session(FOUR_WORDS);
    session.start(0).unwrap();

    assert_eq!(
        session.load("x", Some("scan.pdf".to_string())),
        Err(PlaybackError::UnsupportedDocument)
    );
    assert_eq!(session.state(), READING_TIMER);
    assert_eq!(session.words().len(), 4);

    let effects = session.load("a b c", Some("notes.md".to_string())).unwrap();
    assert!(effects.contains(&Effect::CancelAdvance));
    assert_eq!(session.state(), PlaybackState::Idle);
    assert_eq!(session.document().word_count, 3);
    assert_eq!(session.document().file_name.as_deref(), Some("notes.md"));
}
