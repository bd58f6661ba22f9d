impl<RN, SP, TS> PlaybackSession<RN, SP, TS>
where
    RN: WordRenderer,
    SP: SpeechService,
    TS: TelemetrySink,
{
    /// Timer expiry. Stale tickets, or tickets arriving outside timer-paced reading, do
    /// nothing.
    pub fn on_timer_fired(&mut self, ticket: TimerTicket, now_ms: u64) -> Effects {
        let mut effects = Effects::new();
        if self.state != PlaybackState::Reading(PlaybackMode::Timer) || !self.timer.accept(ticket)
        {
            debug!(
                "session: ignored timer generation={} state={:?}",
                ticket.generation, self.state
            );
            return effects;
        }

        self.cursor.advance();
        if self.cursor.is_finished() {
            self.finish(&mut effects);
        } else {
            self.show_and_schedule(now_ms, &mut effects);
        }
        effects
    }

    /// Audio clock reading for the live track.
    pub fn on_audio_tick(&mut self, handle: AudioHandle, time_ms: u64) -> Effects {
        let mut effects = Effects::new();
        if self.state != PlaybackState::Reading(PlaybackMode::AudioSynced) {
            return effects;
        }

        let position = self.cursor.position();
        let len = self.cursor.len();
        let target = match self.audio.as_mut() {
            Some(audio) if audio.handle() == handle => audio.target_for(time_ms, position, len),
            _ => {
                debug!("session: tick from inactive track {:?}", handle);
                return effects;
            }
        };

        if let Some(index) = target
            && self.cursor.set(index).is_ok()
        {
            debug!(
                "session: audio sync {} -> {} at {}ms",
                position, index, time_ms
            );
            self.render(&mut effects);
        }
        effects
    }

    /// The track played out. Trust the audio boundary over the alignment table.
    pub fn on_audio_ended(&mut self, handle: AudioHandle) -> Effects {
        let mut effects = Effects::new();
        let live = self.active_audio() == Some(handle);
        let audio_mode = matches!(
            self.state,
            PlaybackState::Reading(PlaybackMode::AudioSynced)
                | PlaybackState::Paused {
                    mode: PlaybackMode::AudioSynced,
                    ..
                }
        );
        if !live || !audio_mode {
            debug!("session: ignored end of track {:?}", handle);
            return effects;
        }

        if let Some(audio) = self.audio.as_ref() {
            info!(
                "session: track {:?} ended, last clock {}ms at index {}",
                handle,
                audio.last_time_ms(),
                self.cursor.position()
            );
        }
        self.finish(&mut effects);
        effects
    }

    /// Playback of a synthesized track could not begin. Continue on the timer from the
    /// current word instead of stalling.
    pub fn on_audio_start_failed(&mut self, handle: AudioHandle, now_ms: u64) -> Effects {
        let mut effects = Effects::new();
        if self.active_audio() != Some(handle) {
            return effects;
        }

        let last_clock_ms = self.audio.take().map_or(0, |audio| audio.last_time_ms());
        warn!(
            "session: audio {:?} failed to start at {}ms; falling back to timer",
            handle, last_clock_ms
        );
        match self.state {
            PlaybackState::Reading(PlaybackMode::AudioSynced) => {
                self.state = PlaybackState::Reading(PlaybackMode::Timer);
                self.show_and_schedule(now_ms, &mut effects);
            }
            PlaybackState::Paused {
                mode: PlaybackMode::AudioSynced,
                reason,
            } => {
                self.state = PlaybackState::Paused {
                    mode: PlaybackMode::Timer,
                    reason,
                };
            }
            _ => {}
        }
        self.emit(TelemetryKind::ModeFallback);
        effects
    }
}
