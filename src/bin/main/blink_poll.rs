use std::{
    convert::Infallible,
    fs, io,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
    thread,
    time::Duration,
};

use embassy_time::Timer;
use log::{debug, info, warn};
use rsvp_core::input::{BlinkClassifier, BlinkDebouncer, BlinkState, Event};

use super::{EventQueue, commands::DriverEvent};

const NO_SAMPLE: u8 = 0;
const SAMPLE_OPEN: u8 = 1;
const SAMPLE_CLOSED: u8 = 2;

/// Eye state read from a file an external classifier keeps overwriting with `open` or
/// `closed`.
///
/// Reads happen on a sampler thread; `poll` only takes the newest sample. A missing file, an
/// unreadable one, or a read that never returns all show up as "no signal".
pub(super) struct FileBlinkClassifier {
    path: PathBuf,
    latest: Arc<AtomicU8>,
}

impl FileBlinkClassifier {
    pub(super) fn spawn(path: PathBuf, interval_ms: u64) -> io::Result<Self> {
        let latest = Arc::new(AtomicU8::new(NO_SAMPLE));
        let sampler = Arc::clone(&latest);
        let sampled_path = path.clone();

        thread::Builder::new()
            .name("blink-sampler".into())
            .spawn(move || {
                loop {
                    let sample = match fs::read_to_string(&sampled_path) {
                        Ok(raw) => encode(parse_state(&raw)),
                        Err(err) => {
                            debug!("blink: read {:?} failed: {}", sampled_path, err);
                            NO_SAMPLE
                        }
                    };
                    sampler.store(sample, Ordering::Release);
                    thread::sleep(Duration::from_millis(interval_ms));
                }
            })?;

        Ok(Self { path, latest })
    }
}

impl BlinkClassifier for FileBlinkClassifier {
    type Error = Infallible;

    fn poll(&mut self) -> Result<Option<BlinkState>, Self::Error> {
        // Each sample is consumed once, so a stalled sampler reads as silence.
        Ok(decode(self.latest.swap(NO_SAMPLE, Ordering::AcqRel)))
    }
}

fn parse_state(raw: &str) -> Option<BlinkState> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "closed" | "close" | "1" => Some(BlinkState::Closed),
        "open" | "0" => Some(BlinkState::Open),
        _ => None,
    }
}

fn encode(state: Option<BlinkState>) -> u8 {
    match state {
        Some(BlinkState::Open) => SAMPLE_OPEN,
        Some(BlinkState::Closed) => SAMPLE_CLOSED,
        None => NO_SAMPLE,
    }
}

fn decode(sample: u8) -> Option<BlinkState> {
    match sample {
        SAMPLE_OPEN => Some(BlinkState::Open),
        SAMPLE_CLOSED => Some(BlinkState::Closed),
        _ => None,
    }
}

pub(super) async fn blink_poll_loop(
    mut classifier: FileBlinkClassifier,
    mut debouncer: BlinkDebouncer,
    interval_ms: u64,
    queue: &'static EventQueue,
) -> ! {
    info!(
        "blink: polling {:?} every {}ms",
        classifier.path, interval_ms
    );

    loop {
        Timer::after_millis(interval_ms).await;

        let Some(edge) = debouncer.poll(&mut classifier) else {
            continue;
        };
        info!("blink: {:?}", edge);
        if queue
            .try_send(DriverEvent::Session(Event::Blink(edge)))
            .is_err()
        {
            warn!("blink: event queue full; dropping {:?}", edge);
        }
    }
}
