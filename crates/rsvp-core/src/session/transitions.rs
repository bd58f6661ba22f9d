impl<RN, SP, TS> PlaybackSession<RN, SP, TS>
where
    RN: WordRenderer,
    SP: SpeechService,
    TS: TelemetrySink,
{
    /// Replace the document wholesale and return to `Idle`.
    pub fn load(
        &mut self,
        text: &str,
        file_name: Option<String>,
    ) -> Result<Effects, PlaybackError> {
        if let Some(name) = file_name.as_deref() {
            validate_document_name(name)?;
        }

        let mut effects = Effects::new();
        self.halt(&mut effects);

        let words = WordSequence::from_text(text);
        info!(
            "session: loaded {:?} - {} words found",
            file_name.as_deref().unwrap_or("<text>"),
            words.len()
        );
        self.document = DocumentInfo {
            file_name,
            word_count: words.len(),
        };
        self.cursor = WordCursor::new(words);
        self.state = PlaybackState::Idle;

        let word_count = self.document.word_count;
        self.notify(TelemetryKind::FileUploaded, None, Some(word_count));
        self.render(&mut effects);
        Ok(effects)
    }

    /// Begin from the first word. Tries speech when enabled and degrades to timer pacing
    /// if synthesis fails.
    pub fn start(&mut self, now_ms: u64) -> Result<Effects, PlaybackError> {
        if self.cursor.is_empty() {
            debug!("session: start rejected, no document");
            return Err(PlaybackError::EmptyDocument);
        }

        let mut effects = Effects::new();
        self.halt(&mut effects);
        self.cursor.rewind();

        let mut fell_back = false;
        let mode = if self.config.speech_enabled {
            match self.synthesize() {
                Ok(audio) => {
                    self.audio = Some(audio);
                    PlaybackMode::AudioSynced
                }
                Err(err) => {
                    warn!("session: {}; falling back to timer pacing", err);
                    fell_back = true;
                    PlaybackMode::Timer
                }
            }
        } else {
            PlaybackMode::Timer
        };

        self.state = PlaybackState::Reading(mode);
        info!(
            "session: reading started mode={:?} wpm={} words={}",
            mode,
            self.wpm,
            self.cursor.len()
        );
        self.emit(TelemetryKind::ReadingStarted);
        if fell_back {
            self.emit(TelemetryKind::ModeFallback);
        }

        match (mode, self.active_audio()) {
            (PlaybackMode::AudioSynced, Some(handle)) => {
                self.render(&mut effects);
                push(&mut effects, Effect::StartAudio(handle));
            }
            _ => self.show_and_schedule(now_ms, &mut effects),
        }
        Ok(effects)
    }

    fn synthesize(&mut self) -> Result<AudioAdvancer, PlaybackError> {
        let text = self.cursor.words().joined();
        match self.speech.synthesize(&text, self.wpm) {
            Ok(synthesis) if synthesis.alignment.is_empty() => {
                warn!("session: synthesis returned no alignment");
                Err(PlaybackError::SynthesisFailure)
            }
            Ok(synthesis) => Ok(AudioAdvancer::new(synthesis)),
            Err(err) => {
                warn!("session: synthesis failed: {:?}", err);
                Err(PlaybackError::SynthesisFailure)
            }
        }
    }

    pub fn toggle_pause(&mut self, now_ms: u64) -> Result<Effects, PlaybackError> {
        match self.state {
            PlaybackState::Reading(_) => self.pause_manual(),
            PlaybackState::Paused { .. } => self.resume_manual(now_ms),
            _ => Err(self.invalid(CommandKind::TogglePause)),
        }
    }

    pub fn pause_manual(&mut self) -> Result<Effects, PlaybackError> {
        match self.state {
            PlaybackState::Reading(mode) => Ok(self.pause(mode, PauseReason::Manual)),
            _ => Err(self.invalid(CommandKind::PauseManual)),
        }
    }

    /// Blink-driven pause. Only takes effect while reading, so it never overrides a
    /// pause that is already in place.
    pub fn pause_automatic(&mut self) -> Result<Effects, PlaybackError> {
        match self.state {
            PlaybackState::Reading(mode) => Ok(self.pause(mode, PauseReason::Automatic)),
            _ => Err(self.invalid(CommandKind::PauseAutomatic)),
        }
    }

    fn pause(&mut self, mode: PlaybackMode, reason: PauseReason) -> Effects {
        let mut effects = Effects::new();
        match mode {
            PlaybackMode::Timer => {
                if self.timer.cancel() {
                    push(&mut effects, Effect::CancelAdvance);
                }
            }
            PlaybackMode::AudioSynced => {
                if let Some(handle) = self.active_audio() {
                    push(&mut effects, Effect::PauseAudio(handle));
                }
            }
        }

        self.state = PlaybackState::Paused { mode, reason };
        debug!(
            "session: paused reason={:?} mode={:?} index={}",
            reason,
            mode,
            self.cursor.position()
        );
        self.emit(TelemetryKind::ReadingPaused);
        effects
    }

    /// A manual resume clears either kind of pause.
    pub fn resume_manual(&mut self, now_ms: u64) -> Result<Effects, PlaybackError> {
        match self.state {
            PlaybackState::Paused { mode, .. } => Ok(self.resume(mode, now_ms)),
            _ => Err(self.invalid(CommandKind::ResumeManual)),
        }
    }

    /// "Eyes open" only clears a pause the blink signal itself raised.
    pub fn resume_automatic(&mut self, now_ms: u64) -> Result<Effects, PlaybackError> {
        match self.state {
            PlaybackState::Paused {
                mode,
                reason: PauseReason::Automatic,
            } => Ok(self.resume(mode, now_ms)),
            _ => Err(self.invalid(CommandKind::ResumeAutomatic)),
        }
    }

    fn resume(&mut self, mode: PlaybackMode, now_ms: u64) -> Effects {
        let mut effects = Effects::new();

        let mode = match (mode, self.active_audio()) {
            (PlaybackMode::AudioSynced, Some(handle)) => {
                self.state = PlaybackState::Reading(PlaybackMode::AudioSynced);
                self.render(&mut effects);
                push(&mut effects, Effect::ResumeAudio(handle));
                PlaybackMode::AudioSynced
            }
            _ => {
                self.state = PlaybackState::Reading(PlaybackMode::Timer);
                self.show_and_schedule(now_ms, &mut effects);
                PlaybackMode::Timer
            }
        };

        debug!(
            "session: resumed mode={:?} index={}",
            mode,
            self.cursor.position()
        );
        if matches!(self.state, PlaybackState::Reading(_)) {
            self.emit(TelemetryKind::ReadingResumed);
        }
        effects
    }

    /// Valid from every state.
    pub fn reset(&mut self) -> Effects {
        let mut effects = Effects::new();
        self.halt(&mut effects);
        self.cursor.rewind();
        self.state = PlaybackState::Idle;
        debug!("session: reset");
        self.emit(TelemetryKind::ReadingReset);
        self.render(&mut effects);
        effects
    }

    fn finish(&mut self, effects: &mut Effects) {
        self.halt(effects);
        self.state = PlaybackState::Finished;
        info!("session: finished words={}", self.cursor.len());
        self.emit(TelemetryKind::ReadingFinished);
        self.render(effects);
    }

    /// Clamp and apply a new rate. It takes effect from the next scheduled word.
    pub fn set_rate(&mut self, wpm: u16) -> Effects {
        let wpm = self.config.clamp_wpm(wpm);
        if wpm == self.wpm {
            return Effects::new();
        }

        debug!("session: wpm {} -> {}", self.wpm, wpm);
        self.wpm = wpm;
        self.notify(TelemetryKind::WpmChanged, Some(wpm), None);

        // Redraw for the new rate; the pending advance keeps its delay.
        let mut effects = Effects::new();
        self.render(&mut effects);
        effects
    }

    pub fn step_rate(&mut self, increase: bool) -> Effects {
        let next = if increase {
            self.wpm.saturating_add(self.config.wpm_step)
        } else {
            self.wpm.saturating_sub(self.config.wpm_step)
        };
        self.set_rate(next)
    }
}
