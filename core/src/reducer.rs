// Copyright 2025 HEM Sp. z o.o.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Pure state transitions of the playback engine.
//!
//! A [`Reducer`] takes the current intent and one [`Input`], mutates the intent and returns the
//! side effects (adapter commands, alarm scheduling, persistence, outbound events) as plain
//! values. Nothing here performs I/O; the engine applies the returned effects in order.
//!
//! Field writes go through setters that run the matching change reaction synchronously, so a
//! single input may cascade (readiness triggers an activation, a state change arms the watchdog,
//! and so on). Reactions only run when the value actually changes.

use std::time::Duration;

use log::{debug, error, info, warn};

use crate::config::{EngineConfig, WatchdogPolicy};
use crate::definitions::{PlayerState, SuggestedQuality};
use crate::ingest::{HostCommand, IFrameMessage};
use crate::player::{AdapterEvent, LoadRequest, PlayerCommand};
use crate::player_events::EngineEvent;
use crate::player_state::{IntentFields, PendingActivation, PlaybackIntent, PlayerSettings, Preferences};

/// Everything that can change the engine's intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    ActivateSong { song_id: String, start_seconds: f64 },
    ToggleState,
    /// Any number; rounded and clamped to the volume bounds.
    SetVolume(f64),
    SetMuted(bool),
    Stop,
    Pause,
    Play,
    SeekTo(f64),
    Refresh,
    WatchInTab { song_id: String, url: String },
    SetSuggestedQuality(SuggestedQuality),
    Adapter(AdapterEvent),
    Telemetry(IFrameMessage),
    Command(HostCommand),
    AlarmFired(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Player(PlayerCommand),
    ScheduleAlarm { name: String, delay: Duration },
    ClearAlarm { name: String },
    SavePreferences(Preferences),
    Emit(EngineEvent),
}

/// Result of reducing one input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    pub effects: Vec<Effect>,
    pub changed: IntentFields,
}

impl Transition {
    pub fn player_commands(&self) -> impl Iterator<Item = &PlayerCommand> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Player(command) => Some(command),
            _ => None,
        })
    }
}

pub struct Reducer<'a> {
    intent: &'a mut PlaybackIntent,
    settings: &'a mut PlayerSettings,
    config: &'a EngineConfig,
    stored: Option<Preferences>,
    transition: Transition,
}

impl<'a> Reducer<'a> {
    pub fn new(intent: &'a mut PlaybackIntent, settings: &'a mut PlayerSettings, config: &'a EngineConfig) -> Self {
        Self {
            intent,
            settings,
            config,
            stored: None,
            transition: Transition::default(),
        }
    }

    /// Preferences read from the store, overlaid when the adapter becomes ready.
    pub fn with_stored_preferences(mut self, stored: Option<Preferences>) -> Self {
        self.stored = stored;
        self
    }

    pub fn reduce(mut self, input: Input) -> Transition {
        match input {
            Input::ActivateSong { song_id, start_seconds } => self.activate_song(song_id, start_seconds),
            Input::ToggleState => self.toggle_state(),
            Input::SetVolume(volume) => self.set_volume(volume),
            Input::SetMuted(muted) => self.set_muted(muted),
            Input::Stop => self.stop(),
            Input::Pause => self.pause(),
            Input::Play => self.play(),
            Input::SeekTo(seconds) => self.seek_to(seconds),
            Input::Refresh => self.refresh(),
            Input::WatchInTab { song_id, url } => self.watch_in_tab(&song_id, url),
            Input::SetSuggestedQuality(quality) => self.set_suggested_quality(quality),
            Input::Adapter(event) => self.on_adapter_event(event),
            Input::Telemetry(message) => self.on_telemetry(message),
            Input::Command(command) => self.on_command(command),
            Input::AlarmFired(name) => self.on_alarm(&name),
        }
        self.transition
    }

    // Operations

    fn activate_song(&mut self, song_id: String, start_seconds: f64) {
        let start_seconds = sanitize_seconds(start_seconds);
        if !self.intent.ready {
            debug!("Player not ready, queueing activation of {}", song_id);
            self.set_song_to_activate(Some(PendingActivation { song_id }));
            return;
        }

        let request = LoadRequest {
            video_id: song_id.clone(),
            start_seconds,
            suggested_quality: self.settings.suggested_quality,
        };
        if self.intent.play_on_activate || self.intent.state.is_active() {
            self.command(PlayerCommand::LoadVideoById(request));
        } else {
            self.command(PlayerCommand::CueVideoById(request));
        }

        self.set_loaded_song_id(Some(song_id));
        self.set_current_time(start_seconds);
        self.set_play_on_activate(false);
        self.set_song_to_activate(None);
    }

    fn toggle_state(&mut self) {
        if self.intent.state == PlayerState::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    fn set_volume(&mut self, volume: f64) {
        let volume = self.config.clamp_volume(volume);
        self.set_muted_value(false);
        self.set_volume_value(volume);
        self.save_preferences();
    }

    fn set_muted(&mut self, muted: bool) {
        self.set_muted_value(muted);
        self.save_preferences();
    }

    fn stop(&mut self) {
        self.command(PlayerCommand::Stop);
        self.set_loaded_song_id(None);
        self.set_current_time(0.0);
    }

    fn pause(&mut self) {
        self.command(PlayerCommand::Pause);
    }

    fn play(&mut self) {
        if self.intent.ready {
            self.command(PlayerCommand::Play);
        } else {
            self.set_play_on_activate(true);
            self.command(PlayerCommand::Preload);
        }
    }

    fn seek_to(&mut self, seconds: f64) {
        if self.intent.ready {
            self.command(PlayerCommand::SeekTo(sanitize_seconds(seconds)));
        } else {
            self.set_current_time(seconds);
        }
    }

    fn refresh(&mut self) {
        self.clear_refresh_alarm();

        if let Some(song_id) = self.intent.loaded_song_id.clone() {
            let current_time = self.intent.current_time;
            self.activate_song(song_id, current_time);
        }

        if self.config.watchdog_policy == WatchdogPolicy::LoadedElapsed {
            self.arm_for_loaded_song();
        }
    }

    fn watch_in_tab(&mut self, song_id: &str, url: String) {
        let url = if self.intent.loaded_song_id.as_deref() == Some(song_id) {
            format!("{}?t={}s", url, self.intent.current_time)
        } else {
            url
        };
        self.emit(EngineEvent::OpenTab { url });
        self.pause();
    }

    fn set_suggested_quality(&mut self, quality: SuggestedQuality) {
        self.settings.suggested_quality = quality;
        self.command(PlayerCommand::SetPlaybackQuality(quality));
    }

    // Reconciliation

    fn on_adapter_event(&mut self, event: AdapterEvent) {
        match event {
            AdapterEvent::ReadyChanged(ready) => self.set_ready(ready),
            AdapterEvent::StateChanged(state) => self.set_state(state),
            AdapterEvent::LoadingChanged(loading) => self.set_loading(loading),
            AdapterEvent::LoadAttemptChanged(load_attempt) => {
                self.set_load_attempt(load_attempt);
                if load_attempt >= self.intent.max_load_attempts {
                    warn!("Player reached load attempt {} of {}", load_attempt, self.intent.max_load_attempts);
                }
            }
            AdapterEvent::Error(message) => {
                warn!("Player reported an error: {}", message);
                self.emit(EngineEvent::PlaybackError { message });
            }
        }
    }

    fn on_telemetry(&mut self, message: IFrameMessage) {
        if let Some(current_time) = message.current_time {
            self.set_current_time(current_time);
        }

        // The adapter's own buffering notification is unreliable around seeks.
        if let Some(seeking) = message.seeking {
            if seeking && self.intent.state == PlayerState::Playing {
                self.set_state(PlayerState::Buffering);
            } else if !seeking && self.intent.state == PlayerState::Buffering {
                self.set_state(PlayerState::Playing);
            }
        }

        if let Some(message) = message.error {
            error!("Player frame error: {}", message);
            self.emit(EngineEvent::TelemetryError { message });
        }
    }

    fn on_command(&mut self, command: HostCommand) {
        let volume = self.intent.volume as f64;
        let step = self.config.volume_step as f64;
        match command {
            HostCommand::IncreaseVolume => self.set_volume(volume + step),
            HostCommand::DecreaseVolume => self.set_volume(volume - step),
        }
    }

    fn on_alarm(&mut self, name: &str) {
        if name != self.intent.refresh_alarm_name {
            debug!("Ignoring alarm {} which does not belong to this instance", name);
            return;
        }

        info!("Refresh alarm fired");
        match self.config.watchdog_policy {
            WatchdogPolicy::StateTransition => self.refresh(),
            WatchdogPolicy::LoadedElapsed => {
                // The platform has already dropped the alarm.
                self.set_refresh_alarm_created(false);
                if self.intent.state.is_active() {
                    debug!("Player is busy, deferring refresh until playback stops");
                    self.intent.refresh_deferred = true;
                } else {
                    self.refresh();
                }
            }
        }
    }

    // Change reactions

    fn on_ready_changed(&mut self, ready: bool) {
        if !ready {
            self.intent.refresh_deferred = false;
            self.clear_refresh_alarm();
            return;
        }

        if let Some(stored) = self.stored.take() {
            self.overlay_preferences(stored);
        }
        // Sent unconditionally since an unchanged value would not reach the adapter otherwise.
        self.command(PlayerCommand::SetVolume(self.intent.volume));
        self.command(if self.intent.muted { PlayerCommand::Mute } else { PlayerCommand::UnMute });

        match self.intent.song_to_activate.clone() {
            Some(pending) => self.activate_song(pending.song_id, 0.0),
            None => self.refresh(),
        }
    }

    fn on_loading_changed(&mut self, loading: bool) {
        // Recovering hours later must not resume playback on its own.
        if !loading && !self.intent.ready {
            let state = if self.intent.loaded_song_id.is_none() {
                PlayerState::Unstarted
            } else {
                PlayerState::Paused
            };
            self.set_state(state);
        }
    }

    fn on_state_changed(&mut self, state: PlayerState) {
        match self.config.watchdog_policy {
            WatchdogPolicy::StateTransition => {
                if state.is_active() {
                    self.clear_refresh_alarm();
                } else {
                    self.create_refresh_alarm();
                }
            }
            WatchdogPolicy::LoadedElapsed => {
                if !state.is_active() && self.intent.refresh_deferred {
                    self.intent.refresh_deferred = false;
                    self.refresh();
                }
            }
        }
    }

    fn on_loaded_song_changed(&mut self) {
        if self.config.watchdog_policy != WatchdogPolicy::LoadedElapsed {
            return;
        }
        if self.intent.loaded_song_id.is_some() {
            self.arm_for_loaded_song();
        } else {
            self.intent.refresh_deferred = false;
            self.clear_refresh_alarm();
        }
    }

    fn on_volume_changed(&mut self) {
        if self.intent.ready {
            self.command(PlayerCommand::SetVolume(self.intent.volume));
        } else {
            self.command(PlayerCommand::Preload);
        }
    }

    fn on_muted_changed(&mut self) {
        if !self.intent.ready {
            self.command(PlayerCommand::Preload);
        } else if self.intent.muted {
            self.command(PlayerCommand::Mute);
        } else {
            self.command(PlayerCommand::UnMute);
        }
    }

    // Refresh alarm bookkeeping

    fn create_refresh_alarm(&mut self) {
        if self.intent.refresh_alarm_created {
            return;
        }
        self.set_refresh_alarm_created(true);
        self.transition.effects.push(Effect::ScheduleAlarm {
            name: self.intent.refresh_alarm_name.clone(),
            delay: self.config.refresh_delay,
        });
    }

    fn clear_refresh_alarm(&mut self) {
        if !self.intent.refresh_alarm_created {
            return;
        }
        self.set_refresh_alarm_created(false);
        self.transition.effects.push(Effect::ClearAlarm {
            name: self.intent.refresh_alarm_name.clone(),
        });
    }

    fn arm_for_loaded_song(&mut self) {
        if self.intent.ready && self.intent.loaded_song_id.is_some() {
            self.create_refresh_alarm();
        }
    }

    // Field writes

    fn mark(&mut self, field: IntentFields) {
        self.transition.changed |= field;
    }

    fn set_current_time(&mut self, current_time: f64) {
        let current_time = sanitize_seconds(current_time);
        if self.intent.current_time != current_time {
            self.intent.current_time = current_time;
            self.mark(IntentFields::CurrentTime);
        }
    }

    fn set_play_on_activate(&mut self, play_on_activate: bool) {
        if self.intent.play_on_activate != play_on_activate {
            self.intent.play_on_activate = play_on_activate;
            self.mark(IntentFields::PlayOnActivate);
        }
    }

    fn set_song_to_activate(&mut self, pending: Option<PendingActivation>) {
        if self.intent.song_to_activate != pending {
            self.intent.song_to_activate = pending;
            self.mark(IntentFields::SongIdToActivate);
        }
    }

    fn set_loaded_song_id(&mut self, song_id: Option<String>) {
        if self.intent.loaded_song_id != song_id {
            self.intent.loaded_song_id = song_id;
            self.mark(IntentFields::LoadedSongId);
            self.on_loaded_song_changed();
        }
    }

    fn set_state(&mut self, state: PlayerState) {
        if self.intent.state != state {
            debug!("Player state {} -> {}", self.intent.state, state);
            self.intent.state = state;
            self.mark(IntentFields::State);
            self.on_state_changed(state);
        }
    }

    fn set_ready(&mut self, ready: bool) {
        if self.intent.ready != ready {
            info!("Player ready: {}", ready);
            self.intent.ready = ready;
            self.mark(IntentFields::Ready);
            self.on_ready_changed(ready);
        }
    }

    fn set_loading(&mut self, loading: bool) {
        if self.intent.loading != loading {
            self.intent.loading = loading;
            self.mark(IntentFields::Loading);
            self.on_loading_changed(loading);
        }
    }

    fn set_load_attempt(&mut self, load_attempt: u32) {
        if self.intent.load_attempt != load_attempt {
            self.intent.load_attempt = load_attempt;
            self.mark(IntentFields::LoadAttempt);
        }
    }

    fn set_volume_value(&mut self, volume: u8) {
        if self.intent.volume != volume {
            self.intent.volume = volume;
            self.mark(IntentFields::Volume);
            self.on_volume_changed();
        }
    }

    fn set_muted_value(&mut self, muted: bool) {
        if self.intent.muted != muted {
            self.intent.muted = muted;
            self.mark(IntentFields::Muted);
            self.on_muted_changed();
        }
    }

    fn set_refresh_alarm_created(&mut self, created: bool) {
        if self.intent.refresh_alarm_created != created {
            self.intent.refresh_alarm_created = created;
            self.mark(IntentFields::RefreshAlarmCreated);
        }
    }

    /// Stored values replace the defaults without reaching the adapter; the readiness reaction
    /// sends them explicitly right after.
    fn overlay_preferences(&mut self, stored: Preferences) {
        let volume = self.config.clamp_volume(stored.volume as f64);
        if self.intent.volume != volume {
            self.intent.volume = volume;
            self.mark(IntentFields::Volume);
        }
        if self.intent.muted != stored.muted {
            self.intent.muted = stored.muted;
            self.mark(IntentFields::Muted);
        }
    }

    fn save_preferences(&mut self) {
        let preferences = self.intent.preferences();
        self.transition.effects.push(Effect::SavePreferences(preferences));
    }

    fn command(&mut self, command: PlayerCommand) {
        self.transition.effects.push(Effect::Player(command));
    }

    fn emit(&mut self, event: EngineEvent) {
        self.transition.effects.push(Effect::Emit(event));
    }
}

fn sanitize_seconds(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prop_assert_eq;

    struct Fixture {
        intent: PlaybackIntent,
        settings: PlayerSettings,
        config: EngineConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_config(EngineConfig::default())
        }

        fn with_config(config: EngineConfig) -> Self {
            Self {
                intent: PlaybackIntent::with_alarm_name("refreshAlarm_test".into()),
                settings: PlayerSettings::default(),
                config,
            }
        }

        fn ready() -> Self {
            let mut fixture = Self::new();
            fixture.apply(Input::Adapter(AdapterEvent::ReadyChanged(true)));
            fixture
        }

        fn apply(&mut self, input: Input) -> Transition {
            Reducer::new(&mut self.intent, &mut self.settings, &self.config).reduce(input)
        }

        fn apply_with_stored(&mut self, input: Input, stored: Preferences) -> Transition {
            Reducer::new(&mut self.intent, &mut self.settings, &self.config)
                .with_stored_preferences(Some(stored))
                .reduce(input)
        }

        fn adapter(&mut self, event: AdapterEvent) -> Transition {
            self.apply(Input::Adapter(event))
        }
    }

    fn commands(transition: &Transition) -> Vec<PlayerCommand> {
        transition.player_commands().cloned().collect()
    }

    fn schedules(transition: &Transition) -> usize {
        transition.effects.iter().filter(|e| matches!(e, Effect::ScheduleAlarm { .. })).count()
    }

    fn clears(transition: &Transition) -> usize {
        transition.effects.iter().filter(|e| matches!(e, Effect::ClearAlarm { .. })).count()
    }

    fn cue(song_id: &str, start_seconds: f64) -> PlayerCommand {
        PlayerCommand::CueVideoById(LoadRequest {
            video_id: song_id.into(),
            start_seconds,
            suggested_quality: SuggestedQuality::Default,
        })
    }

    fn load(song_id: &str, start_seconds: f64) -> PlayerCommand {
        PlayerCommand::LoadVideoById(LoadRequest {
            video_id: song_id.into(),
            start_seconds,
            suggested_quality: SuggestedQuality::Default,
        })
    }

    #[test]
    fn set_volume_clamps_and_unmutes() {
        let mut fixture = Fixture::ready();
        fixture.apply(Input::SetVolume(70.0));
        fixture.apply(Input::SetMuted(true));
        assert!(fixture.intent.muted());

        let transition = fixture.apply(Input::SetVolume(150.0));
        assert_eq!(fixture.intent.volume(), 100);
        assert!(!fixture.intent.muted());
        assert!(transition.effects.contains(&Effect::SavePreferences(Preferences { volume: 100, muted: false })));
        assert_eq!(commands(&transition), vec![PlayerCommand::UnMute, PlayerCommand::SetVolume(100)]);

        fixture.apply(Input::SetVolume(-10.0));
        assert_eq!(fixture.intent.volume(), 0);
    }

    #[test]
    fn fractional_and_oversized_volumes_are_rounded_and_clamped() {
        let mut fixture = Fixture::ready();
        let transition = fixture.apply(Input::SetVolume(70.5));
        assert_eq!(fixture.intent.volume(), 71);
        assert_eq!(commands(&transition), vec![PlayerCommand::SetVolume(71)]);

        fixture.apply(Input::SetVolume(3_000_000_000.0));
        assert_eq!(fixture.intent.volume(), 100);
    }

    #[test]
    fn set_volume_saves_even_when_nothing_changes() {
        let mut fixture = Fixture::ready();
        let transition = fixture.apply(Input::SetVolume(50.0));
        assert!(commands(&transition).is_empty());
        assert_eq!(transition.effects, vec![Effect::SavePreferences(Preferences { volume: 50, muted: false })]);
    }

    #[test]
    fn volume_change_before_ready_preloads_the_player() {
        let mut fixture = Fixture::new();
        let transition = fixture.apply(Input::SetVolume(20.0));
        assert_eq!(commands(&transition), vec![PlayerCommand::Preload]);
        assert_eq!(fixture.intent.volume(), 20);
    }

    #[test]
    fn activation_waits_for_readiness() {
        let mut fixture = Fixture::new();
        let transition = fixture.apply(Input::ActivateSong { song_id: "abc".into(), start_seconds: 30.0 });
        assert!(commands(&transition).is_empty());
        assert_eq!(fixture.intent.song_id_to_activate(), Some("abc"));
        assert!(fixture.intent.loaded_song_id().is_none());

        let transition = fixture.adapter(AdapterEvent::ReadyChanged(true));
        assert_eq!(
            commands(&transition),
            vec![PlayerCommand::SetVolume(50), PlayerCommand::UnMute, cue("abc", 0.0)]
        );
        assert_eq!(fixture.intent.song_id_to_activate(), None);
        assert_eq!(fixture.intent.loaded_song_id(), Some("abc"));
        assert_eq!(fixture.intent.current_time(), 0.0);
        assert!(transition.changed.contains(IntentFields::Ready | IntentFields::SongIdToActivate | IntentFields::LoadedSongId));
    }

    #[test]
    fn activation_keeps_playing_when_player_is_active() {
        let mut fixture = Fixture::ready();
        fixture.adapter(AdapterEvent::StateChanged(PlayerState::Playing));
        let transition = fixture.apply(Input::ActivateSong { song_id: "next".into(), start_seconds: 0.0 });
        assert_eq!(commands(&transition), vec![load("next", 0.0)]);

        fixture.adapter(AdapterEvent::StateChanged(PlayerState::Paused));
        let transition = fixture.apply(Input::ActivateSong { song_id: "other".into(), start_seconds: 12.5 });
        assert_eq!(commands(&transition), vec![cue("other", 12.5)]);
        assert_eq!(fixture.intent.current_time(), 12.5);
    }

    #[test]
    fn activation_uses_suggested_quality() {
        let mut fixture = Fixture::ready();
        let transition = fixture.apply(Input::SetSuggestedQuality(SuggestedQuality::Hd720));
        assert_eq!(commands(&transition), vec![PlayerCommand::SetPlaybackQuality(SuggestedQuality::Hd720)]);

        let transition = fixture.apply(Input::ActivateSong { song_id: "abc".into(), start_seconds: 0.0 });
        match commands(&transition).as_slice() {
            [PlayerCommand::CueVideoById(request)] => assert_eq!(request.suggested_quality, SuggestedQuality::Hd720),
            other => panic!("unexpected commands {:?}", other),
        }
    }

    #[test]
    fn play_before_ready_loads_and_plays_on_activation() {
        let mut fixture = Fixture::new();
        let transition = fixture.apply(Input::Play);
        assert_eq!(commands(&transition), vec![PlayerCommand::Preload]);
        assert!(fixture.intent.play_on_activate());

        fixture.adapter(AdapterEvent::ReadyChanged(true));
        let transition = fixture.apply(Input::ActivateSong { song_id: "abc".into(), start_seconds: 0.0 });
        assert_eq!(commands(&transition), vec![load("abc", 0.0)]);
        assert!(!fixture.intent.play_on_activate());
    }

    #[test]
    fn toggle_state_pauses_only_while_playing() {
        let mut fixture = Fixture::ready();
        assert_eq!(commands(&fixture.apply(Input::ToggleState)), vec![PlayerCommand::Play]);
        fixture.adapter(AdapterEvent::StateChanged(PlayerState::Playing));
        assert_eq!(commands(&fixture.apply(Input::ToggleState)), vec![PlayerCommand::Pause]);
        fixture.adapter(AdapterEvent::StateChanged(PlayerState::Buffering));
        assert_eq!(commands(&fixture.apply(Input::ToggleState)), vec![PlayerCommand::Play]);
    }

    #[test]
    fn pause_does_not_touch_local_state() {
        let mut fixture = Fixture::ready();
        fixture.adapter(AdapterEvent::StateChanged(PlayerState::Playing));
        let transition = fixture.apply(Input::Pause);
        assert_eq!(commands(&transition), vec![PlayerCommand::Pause]);
        assert_eq!(fixture.intent.state(), PlayerState::Playing);
        assert!(transition.changed.is_empty());
    }

    #[test]
    fn stop_resets_locally_without_waiting_for_the_player() {
        let mut fixture = Fixture::ready();
        fixture.apply(Input::ActivateSong { song_id: "abc".into(), start_seconds: 42.0 });
        let transition = fixture.apply(Input::Stop);
        assert_eq!(commands(&transition), vec![PlayerCommand::Stop]);
        assert_eq!(fixture.intent.loaded_song_id(), None);
        assert_eq!(fixture.intent.current_time(), 0.0);
    }

    #[test]
    fn seek_before_ready_is_remembered_locally() {
        let mut fixture = Fixture::new();
        let transition = fixture.apply(Input::SeekTo(95.0));
        assert!(commands(&transition).is_empty());
        assert_eq!(fixture.intent.current_time(), 95.0);

        fixture.apply(Input::SeekTo(-3.0));
        assert_eq!(fixture.intent.current_time(), 0.0);

        let mut fixture = Fixture::ready();
        assert_eq!(commands(&fixture.apply(Input::SeekTo(95.0))), vec![PlayerCommand::SeekTo(95.0)]);
    }

    #[test]
    fn readiness_applies_stored_preferences_explicitly() {
        let mut fixture = Fixture::new();
        let transition = fixture.apply_with_stored(
            Input::Adapter(AdapterEvent::ReadyChanged(true)),
            Preferences { volume: 180, muted: true },
        );
        assert_eq!(fixture.intent.volume(), 100);
        assert!(fixture.intent.muted());
        assert_eq!(commands(&transition), vec![PlayerCommand::SetVolume(100), PlayerCommand::Mute]);
    }

    #[test]
    fn readiness_reloads_the_loaded_song() {
        let mut fixture = Fixture::ready();
        fixture.apply(Input::ActivateSong { song_id: "abc".into(), start_seconds: 0.0 });
        fixture.apply(Input::Telemetry(IFrameMessage { current_time: Some(61.0), ..Default::default() }));
        fixture.adapter(AdapterEvent::ReadyChanged(false));

        let transition = fixture.adapter(AdapterEvent::ReadyChanged(true));
        assert_eq!(
            commands(&transition),
            vec![PlayerCommand::SetVolume(50), PlayerCommand::UnMute, cue("abc", 61.0)]
        );
    }

    #[test]
    fn seeking_telemetry_corrects_buffering() {
        let mut fixture = Fixture::ready();
        fixture.adapter(AdapterEvent::StateChanged(PlayerState::Playing));

        fixture.apply(Input::Telemetry(IFrameMessage { seeking: Some(true), ..Default::default() }));
        assert_eq!(fixture.intent.state(), PlayerState::Buffering);

        fixture.apply(Input::Telemetry(IFrameMessage { seeking: Some(false), ..Default::default() }));
        assert_eq!(fixture.intent.state(), PlayerState::Playing);
    }

    #[test]
    fn seeking_telemetry_ignored_while_paused() {
        let mut fixture = Fixture::ready();
        fixture.adapter(AdapterEvent::StateChanged(PlayerState::Paused));
        fixture.apply(Input::Telemetry(IFrameMessage { seeking: Some(true), ..Default::default() }));
        assert_eq!(fixture.intent.state(), PlayerState::Paused);
        fixture.apply(Input::Telemetry(IFrameMessage { seeking: Some(false), ..Default::default() }));
        assert_eq!(fixture.intent.state(), PlayerState::Paused);
    }

    #[test]
    fn telemetry_error_is_forwarded() {
        let mut fixture = Fixture::ready();
        let transition = fixture.apply(Input::Telemetry(IFrameMessage {
            error: Some("boom".into()),
            ..Default::default()
        }));
        assert_eq!(
            transition.effects,
            vec![Effect::Emit(EngineEvent::TelemetryError { message: "boom".into() })]
        );
    }

    #[test]
    fn adapter_errors_are_reemitted_once() {
        let mut fixture = Fixture::ready();
        let transition = fixture.adapter(AdapterEvent::Error("150".into()));
        assert_eq!(
            transition.effects,
            vec![Effect::Emit(EngineEvent::PlaybackError { message: "150".into() })]
        );
    }

    #[test]
    fn refresh_alarm_created_once_while_idle() {
        let mut fixture = Fixture::ready();
        let transition = fixture.adapter(AdapterEvent::StateChanged(PlayerState::Playing));
        assert_eq!(schedules(&transition), 0);

        let transition = fixture.adapter(AdapterEvent::StateChanged(PlayerState::Paused));
        assert_eq!(
            transition.effects,
            vec![Effect::ScheduleAlarm {
                name: "refreshAlarm_test".into(),
                delay: fixture.config.refresh_delay,
            }]
        );
        assert!(fixture.intent.refresh_alarm_created());

        let transition = fixture.adapter(AdapterEvent::StateChanged(PlayerState::Unstarted));
        assert_eq!(schedules(&transition), 0);

        let transition = fixture.adapter(AdapterEvent::StateChanged(PlayerState::Buffering));
        assert_eq!(clears(&transition), 1);
        assert!(!fixture.intent.refresh_alarm_created());

        let transition = fixture.adapter(AdapterEvent::StateChanged(PlayerState::Paused));
        assert_eq!(schedules(&transition), 1);
    }

    #[test]
    fn readiness_lost_clears_the_alarm() {
        let mut fixture = Fixture::ready();
        fixture.adapter(AdapterEvent::StateChanged(PlayerState::Paused));
        let transition = fixture.adapter(AdapterEvent::ReadyChanged(false));
        assert_eq!(clears(&transition), 1);

        let transition = fixture.adapter(AdapterEvent::ReadyChanged(false));
        assert!(transition.effects.is_empty());
    }

    #[test]
    fn loading_finished_while_not_ready_never_resumes_playback() {
        let mut fixture = Fixture::new();
        fixture.adapter(AdapterEvent::LoadingChanged(true));
        fixture.adapter(AdapterEvent::StateChanged(PlayerState::Playing));
        fixture.adapter(AdapterEvent::LoadingChanged(false));
        assert_eq!(fixture.intent.state(), PlayerState::Unstarted);

        fixture.intent.loaded_song_id = Some("abc".into());
        fixture.adapter(AdapterEvent::LoadingChanged(true));
        fixture.adapter(AdapterEvent::LoadingChanged(false));
        assert_eq!(fixture.intent.state(), PlayerState::Paused);
    }

    #[test]
    fn refresh_without_a_loaded_song_only_clears_the_alarm() {
        let mut fixture = Fixture::ready();
        assert!(fixture.apply(Input::Refresh).effects.is_empty());

        fixture.adapter(AdapterEvent::StateChanged(PlayerState::Paused));
        let transition = fixture.apply(Input::Refresh);
        assert_eq!(
            transition.effects,
            vec![Effect::ClearAlarm { name: "refreshAlarm_test".into() }]
        );
    }

    #[test]
    fn matching_alarm_reloads_and_stale_alarm_is_ignored() {
        let mut fixture = Fixture::ready();
        fixture.apply(Input::ActivateSong { song_id: "abc".into(), start_seconds: 0.0 });
        fixture.adapter(AdapterEvent::StateChanged(PlayerState::Paused));
        fixture.apply(Input::Telemetry(IFrameMessage { current_time: Some(10.0), ..Default::default() }));

        let transition = fixture.apply(Input::AlarmFired("refreshAlarm_1234".into()));
        assert!(transition.effects.is_empty());

        let transition = fixture.apply(Input::AlarmFired("refreshAlarm_test".into()));
        assert_eq!(clears(&transition), 1);
        assert_eq!(commands(&transition), vec![cue("abc", 10.0)]);
    }

    #[test]
    fn volume_shortcuts_step_and_clamp() {
        let mut fixture = Fixture::ready();
        fixture.apply(Input::Command(HostCommand::IncreaseVolume));
        assert_eq!(fixture.intent.volume(), 55);
        fixture.apply(Input::Command(HostCommand::DecreaseVolume));
        fixture.apply(Input::Command(HostCommand::DecreaseVolume));
        assert_eq!(fixture.intent.volume(), 45);

        fixture.apply(Input::SetVolume(98.0));
        fixture.apply(Input::Command(HostCommand::IncreaseVolume));
        assert_eq!(fixture.intent.volume(), 100);
    }

    #[test]
    fn watch_in_tab_appends_position_of_loaded_song() {
        let mut fixture = Fixture::ready();
        fixture.apply(Input::ActivateSong { song_id: "abc".into(), start_seconds: 0.0 });
        fixture.apply(Input::Telemetry(IFrameMessage { current_time: Some(30.0), ..Default::default() }));

        let transition = fixture.apply(Input::WatchInTab {
            song_id: "abc".into(),
            url: "https://youtu.be/abc".into(),
        });
        assert_eq!(
            transition.effects,
            vec![
                Effect::Emit(EngineEvent::OpenTab { url: "https://youtu.be/abc?t=30s".into() }),
                Effect::Player(PlayerCommand::Pause),
            ]
        );

        let transition = fixture.apply(Input::WatchInTab {
            song_id: "xyz".into(),
            url: "https://youtu.be/xyz".into(),
        });
        assert_eq!(transition.effects[0], Effect::Emit(EngineEvent::OpenTab { url: "https://youtu.be/xyz".into() }));
    }

    #[test]
    fn mirrored_fields_follow_last_reported_values() {
        let mut fixture = Fixture::new();
        fixture.adapter(AdapterEvent::ReadyChanged(true));
        fixture.apply(Input::SetVolume(30.0));
        fixture.adapter(AdapterEvent::StateChanged(PlayerState::Playing));
        fixture.apply(Input::Command(HostCommand::IncreaseVolume));
        fixture.adapter(AdapterEvent::LoadingChanged(false));
        fixture.apply(Input::SetMuted(true));
        fixture.adapter(AdapterEvent::LoadAttemptChanged(2));

        assert!(fixture.intent.ready());
        assert_eq!(fixture.intent.state(), PlayerState::Playing);
        assert!(!fixture.intent.loading());
        assert_eq!(fixture.intent.load_attempt(), 2);
    }

    #[test]
    fn loaded_elapsed_policy_keeps_alarm_across_state_changes() {
        let config = EngineConfig {
            watchdog_policy: WatchdogPolicy::LoadedElapsed,
            ..EngineConfig::default()
        };
        let mut fixture = Fixture::with_config(config);
        fixture.adapter(AdapterEvent::ReadyChanged(true));

        let transition = fixture.apply(Input::ActivateSong { song_id: "abc".into(), start_seconds: 0.0 });
        assert_eq!(schedules(&transition), 1);

        let transition = fixture.adapter(AdapterEvent::StateChanged(PlayerState::Playing));
        assert!(transition.effects.is_empty());
        assert!(fixture.intent.refresh_alarm_created());

        let transition = fixture.apply(Input::AlarmFired("refreshAlarm_test".into()));
        assert!(commands(&transition).is_empty());
        assert!(!fixture.intent.refresh_alarm_created());

        let transition = fixture.adapter(AdapterEvent::StateChanged(PlayerState::Paused));
        assert_eq!(commands(&transition), vec![cue("abc", 0.0)]);
        assert_eq!(schedules(&transition), 1);

        let transition = fixture.apply(Input::Stop);
        assert_eq!(clears(&transition), 1);
    }

    proptest::proptest! {
        #[test]
        fn any_volume_is_clamped_and_unmuted(
            volume in -1.0e12f64..1.0e12f64,
            muted in proptest::bool::ANY,
            ready in proptest::bool::ANY,
        ) {
            let mut fixture = if ready { Fixture::ready() } else { Fixture::new() };
            fixture.apply(Input::SetMuted(muted));
            fixture.apply(Input::SetVolume(volume));
            prop_assert_eq!(fixture.intent.volume() as f64, volume.round().clamp(0.0, 100.0));
            prop_assert_eq!(fixture.intent.muted(), false);
        }
    }
}
