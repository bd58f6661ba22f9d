#![cfg_attr(not(test), no_std)]

//! Pacing and cursor-arbitration core for RSVP playback.
//!
//! Everything here is clock-free: callers pass `now_ms` and the session answers with
//! [`session::Effect`]s for the driver to carry out.

extern crate alloc;

pub mod audio;
pub mod content;
pub mod cursor;
pub mod error;
pub mod input;
pub mod pacing;
pub mod render;
pub mod session;
pub mod settings;
pub mod telemetry;
pub mod timer;

pub use error::PlaybackError;
