//! Polled eye-state signal and its conversion into pause/resume edges.

use log::debug;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlinkState {
    Open,
    Closed,
}

/// Edge emitted once per closure or reopening.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlinkEdge {
    EyesClosed,
    EyesOpened,
}

/// External eye-state classifier, polled at a fixed interval.
///
/// `Ok(None)` and `Err(_)` both mean "no signal this cycle".
pub trait BlinkClassifier {
    type Error: core::fmt::Debug;

    fn poll(&mut self) -> Result<Option<BlinkState>, Self::Error>;
}

/// Turns a level signal into edges. A closure only counts after `close_samples`
/// consecutive `Closed` readings; reopening is reported on the first `Open` reading.
#[derive(Clone, Copy, Debug)]
pub struct BlinkDebouncer {
    close_samples: u8,
    closed_streak: u8,
    eyes_closed: bool,
}

impl BlinkDebouncer {
    pub fn new(close_samples: u8) -> Self {
        Self {
            close_samples: close_samples.max(1),
            closed_streak: 0,
            eyes_closed: false,
        }
    }

    /// Feed one poll result. Missing samples leave the remembered level untouched.
    pub fn observe(&mut self, sample: Option<BlinkState>) -> Option<BlinkEdge> {
        match sample? {
            BlinkState::Closed => {
                if self.eyes_closed {
                    return None;
                }
                self.closed_streak = self.closed_streak.saturating_add(1);
                if self.closed_streak < self.close_samples {
                    return None;
                }
                self.eyes_closed = true;
                debug!("blink: eyes closed after {} samples", self.closed_streak);
                Some(BlinkEdge::EyesClosed)
            }
            BlinkState::Open => {
                self.closed_streak = 0;
                if !self.eyes_closed {
                    return None;
                }
                self.eyes_closed = false;
                debug!("blink: eyes reopened");
                Some(BlinkEdge::EyesOpened)
            }
        }
    }

    /// Poll `classifier` once and debounce the result. Transport failures are swallowed.
    pub fn poll<C: BlinkClassifier>(&mut self, classifier: &mut C) -> Option<BlinkEdge> {
        match classifier.poll() {
            Ok(sample) => self.observe(sample),
            Err(err) => {
                debug!("blink: poll failed, treating as no signal: {:?}", err);
                None
            }
        }
    }
}

impl Default for BlinkDebouncer {
    fn default() -> Self {
        Self::new(1)
    }
}
