use std::{env, path::PathBuf};

use log::{info, warn};
use rsvp_core::settings::ReaderConfig;

const SETTINGS_FILE: &str = ".rsvp-reader-settings.json";

/// Startup configuration: reader defaults overridden from the environment, plus the
/// optional document path from the command line.
#[derive(Clone, Debug)]
pub(super) struct DriverConfig {
    pub(super) reader: ReaderConfig,
    /// Explicit `RSVP_WPM`; wins over the persisted rate.
    pub(super) wpm_override: Option<u16>,
    pub(super) document: Option<PathBuf>,
    pub(super) blink_file: Option<PathBuf>,
    pub(super) settings_path: PathBuf,
}

impl DriverConfig {
    pub(super) fn from_env() -> Self {
        let mut reader = ReaderConfig::default();
        let wpm_override = parse_var::<u16>("RSVP_WPM").map(|wpm| reader.clamp_wpm(wpm));
        if let Some(speech) = env::var("RSVP_SPEECH").ok().as_deref().and_then(parse_switch) {
            reader = reader.with_speech(speech);
        }
        if let Some(interval) = parse_var::<u64>("RSVP_BLINK_POLL_MS") {
            reader.blink_poll_interval_ms = interval.max(10);
        }
        if let Some(samples) = parse_var::<u8>("RSVP_BLINK_CLOSE_SAMPLES") {
            reader.blink_close_samples = samples.max(1);
        }

        let settings_path = env::var_os("RSVP_SETTINGS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE));

        let config = Self {
            reader,
            wpm_override,
            document: env::args_os().nth(1).map(PathBuf::from),
            blink_file: env::var_os("RSVP_BLINK_FILE").map(PathBuf::from),
            settings_path,
        };
        info!(
            "config: wpm_override={:?} speech={} blink_poll_ms={} blink_file={:?} settings={:?}",
            config.wpm_override,
            config.reader.speech_enabled,
            config.reader.blink_poll_interval_ms,
            config.blink_file,
            config.settings_path
        );
        config
    }
}

pub(super) fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Some(true),
        "0" | "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("config: ignoring {}={:?}; keeping default", name, raw);
            None
        }
    }
}
