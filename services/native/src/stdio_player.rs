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

use std::sync::Mutex;

use async_trait::async_trait;
use futures::channel::mpsc::{self, Receiver, Sender};
use futures::SinkExt;
use log::warn;
use playsync_core::definitions::SuggestedQuality;
use playsync_core::player::{AdapterEvent, AdapterSnapshot, LoadRequest, PlayerCommand, PlayerEventListener};
use playsync_core::{PlayerAdapter, PlayerError};
use tokio::sync::mpsc::UnboundedSender;

use crate::protocol::HostOutput;

const NOTIFICATION_CAPACITY: usize = 64;

/// Adapter whose player lives on the other side of stdio. Commands are written out as
/// `adapterCommand` lines; notifications come back through [`StdioPlayerAdapter::deliver`].
pub struct StdioPlayerAdapter {
    output: UnboundedSender<HostOutput>,
    notifications_tx: Sender<AdapterEvent>,
    notifications_rx: Mutex<Option<Receiver<AdapterEvent>>>,
    snapshot: Mutex<AdapterSnapshot>,
}

impl StdioPlayerAdapter {
    pub fn new(output: UnboundedSender<HostOutput>) -> Self {
        let (notifications_tx, notifications_rx) = mpsc::channel(NOTIFICATION_CAPACITY);
        Self {
            output,
            notifications_tx,
            notifications_rx: Mutex::new(Some(notifications_rx)),
            snapshot: Mutex::new(AdapterSnapshot::default()),
        }
    }

    /// Records a notification reported by the browser side and passes it on to the listener.
    pub async fn deliver(&self, event: AdapterEvent) {
        if let Ok(mut snapshot) = self.snapshot.lock() {
            match &event {
                AdapterEvent::ReadyChanged(ready) => snapshot.ready = *ready,
                AdapterEvent::LoadingChanged(loading) => snapshot.loading = *loading,
                AdapterEvent::LoadAttemptChanged(load_attempt) => snapshot.load_attempt = *load_attempt,
                AdapterEvent::StateChanged(_) | AdapterEvent::Error(_) => {}
            }
        }
        let mut tx = self.notifications_tx.clone();
        if let Err(e) = tx.send(event).await {
            warn!("Dropping adapter notification: {}", e);
        }
    }

    fn send(&self, command: PlayerCommand) -> Result<(), PlayerError> {
        self.output
            .send(HostOutput::AdapterCommand { command })
            .map_err(|_| PlayerError::UnknownError("stdout writer closed".into()))
    }
}

#[async_trait]
impl PlayerAdapter for StdioPlayerAdapter {
    async fn snapshot(&self) -> Result<AdapterSnapshot, PlayerError> {
        self.snapshot
            .lock()
            .map(|snapshot| *snapshot)
            .map_err(|e| PlayerError::UnknownError(e.to_string()))
    }
    async fn load_video_by_id(&self, request: &LoadRequest) -> Result<(), PlayerError> {
        self.send(PlayerCommand::LoadVideoById(request.clone()))
    }
    async fn cue_video_by_id(&self, request: &LoadRequest) -> Result<(), PlayerError> {
        self.send(PlayerCommand::CueVideoById(request.clone()))
    }
    async fn play(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Play)
    }
    async fn pause(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Pause)
    }
    async fn stop(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Stop)
    }
    async fn seek_to(&self, seconds: f64) -> Result<(), PlayerError> {
        self.send(PlayerCommand::SeekTo(seconds))
    }
    async fn set_volume(&self, volume: u8) -> Result<(), PlayerError> {
        self.send(PlayerCommand::SetVolume(volume))
    }
    async fn mute(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Mute)
    }
    async fn un_mute(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::UnMute)
    }
    async fn set_playback_quality(&self, quality: SuggestedQuality) -> Result<(), PlayerError> {
        self.send(PlayerCommand::SetPlaybackQuality(quality))
    }
    async fn preload(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Preload)
    }

    async fn listen_to_player_notifications(&self) -> Result<PlayerEventListener, PlayerError> {
        self.notifications_rx
            .lock()
            .map_err(|e| PlayerError::UnknownError(e.to_string()))?
            .take()
            .ok_or_else(|| PlayerError::UnknownError("notifications already taken".into()))
    }
}
