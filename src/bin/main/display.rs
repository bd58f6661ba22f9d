use log::info;
use rsvp_core::{
    PlaybackError,
    render::{Screen, WordView},
    telemetry::{TelemetryEvent, TelemetrySink},
};

const ORP_ANCHOR_COLUMN: usize = 16;

pub(super) fn draw(screen: &Screen) {
    println!("{}", format_screen(screen));
}

pub(super) fn message(err: &PlaybackError) {
    println!("! {}", err);
}

fn format_screen(screen: &Screen) -> String {
    match screen {
        Screen::Ready { total_words: 0, wpm } => {
            format!("-- no document loaded ({} wpm); `load PATH` to open one", wpm)
        }
        Screen::Ready { total_words, wpm } => {
            format!("-- ready: {} words at {} wpm; press enter to start", total_words, wpm)
        }
        Screen::Word(view) => format_word(view),
        Screen::Finished { total_words } => {
            format!("-- finished {} words; enter restarts", total_words)
        }
    }
}

/// One line per word, the focal letter pinned to a fixed column.
fn format_word(view: &WordView) -> String {
    let parts = &view.parts;
    let pad = ORP_ANCHOR_COLUMN.saturating_sub(parts.before.chars().count());
    let word_width =
        parts.before.chars().count() + parts.focal.chars().count() + parts.after.chars().count();
    let trail = (ORP_ANCHOR_COLUMN * 2).saturating_sub(pad + word_width);

    format!(
        "{:pad$}{}\x1b[1;31m{}\x1b[0m{}{:trail$}{:>5}/{} {:>4} wpm {:>3}%",
        "",
        parts.before,
        parts.focal,
        parts.after,
        "",
        view.index + 1,
        view.total,
        view.wpm,
        view.progress_pct,
    )
}

/// Telemetry beacon written to the log as JSON lines.
#[derive(Default)]
pub(super) struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    type Error = serde_json::Error;

    fn notify(&mut self, event: &TelemetryEvent<'_>) -> Result<(), Self::Error> {
        let json = serde_json::to_string(event)?;
        info!(target: "telemetry", "{}", json);
        Ok(())
    }
}
