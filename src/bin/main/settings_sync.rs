use std::{fs, io, path::PathBuf};

use rsvp_core::settings::{PersistedSettings, SettingsStore};

use super::SETTINGS_SAVE_DEBOUNCE_MS;

/// Settings persisted as a JSON object.
pub(super) struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub(super) fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SettingsStore for FileSettingsStore {
    type Error = io::Error;

    fn load(&mut self) -> Result<Option<PersistedSettings>, Self::Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };

        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&mut self, settings: &PersistedSettings) -> Result<(), Self::Error> {
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)
    }
}

pub(super) struct SettingsSyncState {
    last_saved: PersistedSettings,
    pending: Option<(PersistedSettings, u64)>,
}

impl SettingsSyncState {
    pub(super) fn new(initial: PersistedSettings) -> Self {
        Self {
            last_saved: initial,
            pending: None,
        }
    }

    pub(super) fn track_current(&mut self, current: PersistedSettings, now_ms: u64) {
        if current == self.last_saved {
            self.pending = None;
            return;
        }

        match self.pending.as_mut() {
            Some((pending, changed_at_ms)) => {
                if *pending != current {
                    *pending = current;
                    *changed_at_ms = now_ms;
                }
            }
            None => {
                self.pending = Some((current, now_ms));
            }
        }
    }

    /// Deadline of the pending save, if any.
    pub(super) fn due_ms(&self) -> Option<u64> {
        self.pending
            .map(|(_, changed_at_ms)| changed_at_ms + SETTINGS_SAVE_DEBOUNCE_MS)
    }

    pub(super) fn flush_if_due<S: SettingsStore>(&mut self, store: &mut S, now_ms: u64) {
        let Some((candidate, changed_at_ms)) = self.pending else {
            return;
        };

        if now_ms.saturating_sub(changed_at_ms) < SETTINGS_SAVE_DEBOUNCE_MS {
            return;
        }
        self.flush(store, candidate, now_ms);
    }

    /// Save immediately, regardless of debounce. Used on shutdown.
    pub(super) fn flush_now<S: SettingsStore>(&mut self, store: &mut S, now_ms: u64) {
        if let Some((candidate, _)) = self.pending {
            self.flush(store, candidate, now_ms);
        }
    }

    fn flush<S: SettingsStore>(&mut self, store: &mut S, candidate: PersistedSettings, now_ms: u64) {
        if store.save(&candidate).is_ok() {
            log::info!("settings: saved wpm={}", candidate.wpm);
            self.last_saved = candidate;
            self.pending = None;
        } else {
            // Keep pending changes and retry later if the file is temporarily unavailable.
            log::info!("settings: save failed; retrying later");
            self.pending = Some((candidate, now_ms));
        }
    }
}
