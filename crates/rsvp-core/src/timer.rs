//! Single-shot advance scheduling for timer-paced playback.
//!
//! Every schedule or cancel bumps a generation counter. A ticket only fires if its
//! generation is still current, so at most one advance is ever pending and a cancelled
//! ticket that fires late does nothing.

use log::debug;

/// Handle for one scheduled advance. The driver sleeps until `due_ms` and hands the
/// ticket back to the session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimerTicket {
    pub generation: u32,
    pub due_ms: u64,
    pub delay_ms: u64,
}

#[derive(Clone, Debug, Default)]
pub struct TimerAdvancer {
    generation: u32,
    pending: Option<TimerTicket>,
}

impl TimerAdvancer {
    pub const fn new() -> Self {
        Self {
            generation: 0,
            pending: None,
        }
    }

    /// Replace any pending advance with a new one `delay_ms` from `now_ms`.
    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64) -> TimerTicket {
        self.generation = self.generation.wrapping_add(1);
        let ticket = TimerTicket {
            generation: self.generation,
            due_ms: now_ms.saturating_add(delay_ms),
            delay_ms,
        };
        self.pending = Some(ticket);
        ticket
    }

    /// Invalidate the pending advance. Returns `true` if one was pending.
    pub fn cancel(&mut self) -> bool {
        self.generation = self.generation.wrapping_add(1);
        match self.pending.take() {
            Some(ticket) => {
                debug!(
                    "timer: cancelled generation={} due_ms={}",
                    ticket.generation, ticket.due_ms
                );
                true
            }
            None => false,
        }
    }

    /// Consume `ticket` if it is the pending one. Stale tickets are rejected.
    pub fn accept(&mut self, ticket: TimerTicket) -> bool {
        if self.pending == Some(ticket) {
            self.pending = None;
            true
        } else {
            debug!(
                "timer: stale ticket generation={} current={}",
                ticket.generation, self.generation
            );
            false
        }
    }

    pub fn pending(&self) -> Option<TimerTicket> {
        self.pending
    }
}
