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

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::select;
use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::spawn_blocking;

use crate::alarms::AlarmScheduler;
use crate::config::EngineConfig;
use crate::definitions::SuggestedQuality;
use crate::player::{AdapterEvent, Player, PlayerAdapter};
use crate::player_events::EngineEvent;
use crate::player_state::{IntentFields, PlaybackIntent, PlayerSettings, Preferences};
use crate::preferences::PreferenceStore;
use crate::reducer::{Effect, Input, Reducer};
use crate::service::{spawn_service, ServiceHandle};

const EVENTS_CAPACITY: usize = 256;

/// Owns the playback intent and applies every input to it in arrival order.
///
/// Each input is reduced to a list of effects which are then executed in order: adapter
/// commands are awaited one after another, alarms and preferences go to their collaborators and
/// outbound events are broadcast to subscribers.
pub struct PlayerStateEngine {
    intent: PlaybackIntent,
    settings: PlayerSettings,
    config: EngineConfig,
    player: Player,
    alarms: Arc<dyn AlarmScheduler>,
    store: Arc<dyn PreferenceStore>,
    events_tx: broadcast::Sender<EngineEvent>,
}

impl PlayerStateEngine {
    pub fn new(
        config: EngineConfig,
        player: Player,
        alarms: Arc<dyn AlarmScheduler>,
        store: Arc<dyn PreferenceStore>,
    ) -> Self {
        let mut intent = PlaybackIntent::new();
        intent.max_load_attempts = config.max_load_attempts;
        intent.volume = config.clamp_volume(config.default_volume as f64);
        let (events_tx, _) = broadcast::channel(EVENTS_CAPACITY);
        Self {
            intent,
            settings: PlayerSettings::default(),
            config,
            player,
            alarms,
            store,
            events_tx,
        }
    }

    pub fn with_settings(mut self, settings: PlayerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events_tx.subscribe()
    }

    pub fn intent(&self) -> &PlaybackIntent {
        &self.intent
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mirrors whatever the adapter already knows. Readiness goes last so that a ready adapter
    /// is reconciled with the loading flags already in place.
    pub async fn initialize(&mut self) {
        match self.player.snapshot().await {
            Ok(snapshot) => {
                self.handle(Input::Adapter(AdapterEvent::LoadAttemptChanged(snapshot.load_attempt))).await;
                self.handle(Input::Adapter(AdapterEvent::LoadingChanged(snapshot.loading))).await;
                self.handle(Input::Adapter(AdapterEvent::ReadyChanged(snapshot.ready))).await;
            }
            Err(e) => debug!("Player snapshot unavailable: {}", e),
        }
    }

    /// Reduces one input and executes its effects. Returns the intent fields that changed.
    pub async fn handle(&mut self, input: Input) -> IntentFields {
        let stored = if input == Input::Adapter(AdapterEvent::ReadyChanged(true)) && !self.intent.ready {
            self.load_preferences().await
        } else {
            None
        };

        let transition = Reducer::new(&mut self.intent, &mut self.settings, &self.config)
            .with_stored_preferences(stored)
            .reduce(input);

        for effect in transition.effects {
            self.apply(effect).await;
        }

        if !transition.changed.is_empty() {
            self.publish(EngineEvent::IntentChanged {
                fields: transition.changed,
                intent: self.intent.clone(),
            });
        }
        transition.changed
    }

    pub async fn activate_song(&mut self, song_id: impl Into<String>, start_seconds: f64) {
        self.handle(Input::ActivateSong { song_id: song_id.into(), start_seconds }).await;
    }

    pub async fn toggle_state(&mut self) {
        self.handle(Input::ToggleState).await;
    }

    pub async fn set_volume(&mut self, volume: f64) {
        self.handle(Input::SetVolume(volume)).await;
    }

    pub async fn set_muted(&mut self, muted: bool) {
        self.handle(Input::SetMuted(muted)).await;
    }

    pub async fn stop(&mut self) {
        self.handle(Input::Stop).await;
    }

    pub async fn pause(&mut self) {
        self.handle(Input::Pause).await;
    }

    pub async fn play(&mut self) {
        self.handle(Input::Play).await;
    }

    pub async fn seek_to(&mut self, seconds: f64) {
        self.handle(Input::SeekTo(seconds)).await;
    }

    pub async fn refresh(&mut self) {
        self.handle(Input::Refresh).await;
    }

    pub async fn watch_in_tab(&mut self, song_id: impl Into<String>, url: impl Into<String>) {
        self.handle(Input::WatchInTab { song_id: song_id.into(), url: url.into() }).await;
    }

    pub async fn set_suggested_quality(&mut self, quality: SuggestedQuality) {
        self.handle(Input::SetSuggestedQuality(quality)).await;
    }

    /// Runs the engine on its own task, consuming inputs until stopped or until every sender of
    /// `inbox` is gone.
    pub fn run(mut self, mut inbox: UnboundedReceiver<Input>) -> ServiceHandle {
        spawn_service(move |mut stop| async move {
            self.initialize().await;
            loop {
                select! {
                    biased;
                    _ = stop.signaled() => {
                        info!("Engine shutdown requested");
                        break;
                    }
                    input = inbox.recv() => match input {
                        Some(input) => {
                            self.handle(input).await;
                        }
                        None => {
                            info!("Engine inbox closed; stopping");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Store access is blocking I/O, so it runs on the blocking pool.
    async fn load_preferences(&self) -> Option<Preferences> {
        let store = self.store.clone();
        match spawn_blocking(move || store.load()).await {
            Ok(Ok(stored)) => stored,
            Ok(Err(e)) => {
                warn!("Failed to load preferences, using current values: {}", e);
                None
            }
            Err(e) => {
                warn!("Preference load task failed: {}", e);
                None
            }
        }
    }

    async fn save_preferences(&self, preferences: Preferences) {
        let store = self.store.clone();
        match spawn_blocking(move || store.save(&preferences)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Failed to save preferences: {}", e),
            Err(e) => error!("Preference save task failed: {}", e),
        }
    }

    async fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Player(command) => {
                debug!("Player command: {:?}", command);
                if let Err(e) = self.player.execute(&command).await {
                    warn!("Player command {:?} failed: {}", command, e);
                }
            }
            Effect::ScheduleAlarm { name, delay } => {
                debug!("Scheduling {} in {:?}", name, delay);
                self.alarms.schedule_once(&name, delay);
            }
            Effect::ClearAlarm { name } => {
                debug!("Clearing {}", name);
                self.alarms.cancel(&name);
            }
            Effect::SavePreferences(preferences) => self.save_preferences(preferences).await,
            Effect::Emit(event) => self.publish(event),
        }
    }

    fn publish(&self, event: EngineEvent) {
        // No subscribers is not an error.
        let _ = self.events_tx.send(event);
    }
}
