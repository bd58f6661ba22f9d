impl<RN, SP, TS> PlaybackSession<RN, SP, TS>
where
    RN: WordRenderer,
    SP: SpeechService,
    TS: TelemetrySink,
{
    /// Move the cursor to `index` in `[0, len)`. Timer playback restarts from the new
    /// word; audio playback keeps its own clock and re-syncs on the next tick.
    pub fn jump_to(&mut self, index: usize, now_ms: u64) -> Result<Effects, PlaybackError> {
        if self.state == PlaybackState::Idle {
            return Err(self.invalid(CommandKind::JumpTo));
        }
        let len = self.cursor.len();
        if index >= len {
            return Err(PlaybackError::OutOfRange { index, len });
        }

        let mut effects = Effects::new();
        let from = self.cursor.position();
        self.cursor.set(index)?;
        if self.timer.cancel() {
            push(&mut effects, Effect::CancelAdvance);
        }

        match self.state {
            PlaybackState::Reading(PlaybackMode::Timer) => {
                self.show_and_schedule(now_ms, &mut effects);
            }
            PlaybackState::Reading(PlaybackMode::AudioSynced) | PlaybackState::Paused { .. } => {
                self.render(&mut effects);
            }
            PlaybackState::Finished => {
                // The finished track cannot be resumed; continue on the timer from here.
                if let Some(audio) = self.audio.take() {
                    push(&mut effects, Effect::StopAudio(audio.handle()));
                }
                self.state = PlaybackState::Paused {
                    mode: PlaybackMode::Timer,
                    reason: PauseReason::Manual,
                };
                self.render(&mut effects);
            }
            PlaybackState::Idle => {}
        }

        debug!("session: jump {} -> {} state={:?}", from, index, self.state);
        self.emit(TelemetryKind::Navigated);
        Ok(effects)
    }

    /// Case-insensitive search for a single token. Scans forward from the word after the
    /// cursor, then wraps to the start up to and including the cursor itself. Terms that
    /// tokenizing would split (spaces, dashes) can never match and are rejected.
    pub fn search_next(&mut self, term: &str, now_ms: u64) -> Result<Effects, PlaybackError> {
        if self.state == PlaybackState::Idle {
            return Err(self.invalid(CommandKind::SearchNext));
        }

        let term = term.trim();
        if term.is_empty() || term.contains(is_separator) {
            return Err(PlaybackError::InvalidSearchTerm);
        }

        let Some(index) = self.find_next(term) else {
            debug!("session: search {:?} found nothing", term);
            return Err(PlaybackError::NotFound);
        };
        self.jump_to(index, now_ms)
    }

    fn find_next(&self, term: &str) -> Option<usize> {
        let len = self.cursor.len();
        if len == 0 {
            return None;
        }

        let needle: String = term.to_lowercase();
        let cursor = self.cursor.position().min(len - 1);
        let words = self.cursor.words();
        let matches = |index: &usize| {
            words
                .get(*index)
                .is_some_and(|word| word.to_lowercase().contains(needle.as_str()))
        };

        (cursor + 1..len)
            .find(matches)
            .or_else(|| (0..=cursor).find(matches))
    }
}
