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

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::definitions::{PlayerState, SuggestedQuality};

#[derive(Debug, PartialEq, Clone)]
pub enum PlayerError {
    NotReady,
    FeatureNotSupported,
    UnknownError(String),
}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "Player is not ready"),
            Self::FeatureNotSupported => write!(f, "Feature not supported"),
            Self::UnknownError(e) => write!(f, "Unknown error: {}", e),
        }
    }
}

impl std::error::Error for PlayerError {}

/// Everything the adapter needs to load or cue a song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub video_id: String,
    pub start_seconds: f64,
    pub suggested_quality: SuggestedQuality,
}

/// Readiness, loading flag and load attempt as seen by the adapter at a single point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterSnapshot {
    pub ready: bool,
    pub loading: bool,
    pub load_attempt: u32,
}

impl Default for AdapterSnapshot {
    fn default() -> Self {
        Self {
            ready: false,
            loading: false,
            load_attempt: 1,
        }
    }
}

/// Notifications raised by the adapter. Delivery order between kinds is not guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum AdapterEvent {
    ReadyChanged(bool),
    StateChanged(PlayerState),
    LoadingChanged(bool),
    LoadAttemptChanged(u32),
    Error(String),
}

/// A single command for the adapter, as produced by the reducer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "args", rename_all = "camelCase")]
pub enum PlayerCommand {
    LoadVideoById(LoadRequest),
    CueVideoById(LoadRequest),
    Play,
    Pause,
    Stop,
    SeekTo(f64),
    SetVolume(u8),
    Mute,
    UnMute,
    SetPlaybackQuality(SuggestedQuality),
    Preload,
}

pub type PlayerEventListener = futures::channel::mpsc::Receiver<AdapterEvent>;

/// Command and event surface of the embedded player.
///
/// Commands are fire-and-forget from the engine's point of view: their effects are only observed
/// through later notifications.
#[async_trait]
pub trait PlayerAdapter: Send + Sync {
    async fn snapshot(&self) -> Result<AdapterSnapshot, PlayerError>
    {
        Err(PlayerError::FeatureNotSupported)
    }
    async fn load_video_by_id(&self, _request: &LoadRequest) -> Result<(), PlayerError>
    {
        Err(PlayerError::FeatureNotSupported)
    }
    async fn cue_video_by_id(&self, _request: &LoadRequest) -> Result<(), PlayerError>
    {
        Err(PlayerError::FeatureNotSupported)
    }
    async fn play(&self) -> Result<(), PlayerError>
    {
        Err(PlayerError::FeatureNotSupported)
    }
    async fn pause(&self) -> Result<(), PlayerError>
    {
        Err(PlayerError::FeatureNotSupported)
    }
    async fn stop(&self) -> Result<(), PlayerError>
    {
        Err(PlayerError::FeatureNotSupported)
    }
    async fn seek_to(&self, _seconds: f64) -> Result<(), PlayerError>
    {
        Err(PlayerError::FeatureNotSupported)
    }
    async fn set_volume(&self, _volume: u8) -> Result<(), PlayerError>
    {
        Err(PlayerError::FeatureNotSupported)
    }
    async fn mute(&self) -> Result<(), PlayerError>
    {
        Err(PlayerError::FeatureNotSupported)
    }
    async fn un_mute(&self) -> Result<(), PlayerError>
    {
        Err(PlayerError::FeatureNotSupported)
    }
    async fn set_playback_quality(&self, _quality: SuggestedQuality) -> Result<(), PlayerError>
    {
        Err(PlayerError::FeatureNotSupported)
    }
    async fn preload(&self) -> Result<(), PlayerError>
    {
        Err(PlayerError::FeatureNotSupported)
    }

    async fn listen_to_player_notifications(&self) -> Result<PlayerEventListener, PlayerError> {
        Err(PlayerError::FeatureNotSupported)
    }
}

#[derive(Clone)]
pub struct Player {
    player_impl: Arc<dyn PlayerAdapter + Sync + Send>,
}

impl Player {
    pub fn new(player_impl: Arc<dyn PlayerAdapter + Sync + Send>) -> Self {
        Self { player_impl }
    }

    pub async fn execute(&self, command: &PlayerCommand) -> Result<(), PlayerError> {
        match command {
            PlayerCommand::LoadVideoById(request) => self.load_video_by_id(request).await,
            PlayerCommand::CueVideoById(request) => self.cue_video_by_id(request).await,
            PlayerCommand::Play => self.play().await,
            PlayerCommand::Pause => self.pause().await,
            PlayerCommand::Stop => self.stop().await,
            PlayerCommand::SeekTo(seconds) => self.seek_to(*seconds).await,
            PlayerCommand::SetVolume(volume) => self.set_volume(*volume).await,
            PlayerCommand::Mute => self.mute().await,
            PlayerCommand::UnMute => self.un_mute().await,
            PlayerCommand::SetPlaybackQuality(quality) => self.set_playback_quality(*quality).await,
            PlayerCommand::Preload => self.preload().await,
        }
    }
}

#[async_trait]
impl PlayerAdapter for Player {
    async fn snapshot(&self) -> Result<AdapterSnapshot, PlayerError> {
        self.player_impl.snapshot().await
    }
    async fn load_video_by_id(&self, request: &LoadRequest) -> Result<(), PlayerError> {
        self.player_impl.load_video_by_id(request).await
    }
    async fn cue_video_by_id(&self, request: &LoadRequest) -> Result<(), PlayerError> {
        self.player_impl.cue_video_by_id(request).await
    }
    async fn play(&self) -> Result<(), PlayerError> {
        self.player_impl.play().await
    }
    async fn pause(&self) -> Result<(), PlayerError> {
        self.player_impl.pause().await
    }
    async fn stop(&self) -> Result<(), PlayerError> {
        self.player_impl.stop().await
    }
    async fn seek_to(&self, seconds: f64) -> Result<(), PlayerError> {
        self.player_impl.seek_to(seconds).await
    }
    async fn set_volume(&self, volume: u8) -> Result<(), PlayerError> {
        self.player_impl.set_volume(volume).await
    }
    async fn mute(&self) -> Result<(), PlayerError> {
        self.player_impl.mute().await
    }
    async fn un_mute(&self) -> Result<(), PlayerError> {
        self.player_impl.un_mute().await
    }
    async fn set_playback_quality(&self, quality: SuggestedQuality) -> Result<(), PlayerError> {
        self.player_impl.set_playback_quality(quality).await
    }
    async fn preload(&self) -> Result<(), PlayerError> {
        self.player_impl.preload().await
    }

    async fn listen_to_player_notifications(&self) -> Result<PlayerEventListener, PlayerError> {
        self.player_impl.listen_to_player_notifications().await
    }
}
