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
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const MIN_VOLUME: u8 = 0;
pub const MAX_VOLUME: u8 = 100;
/// Used until stored preferences are applied.
pub const DEFAULT_VOLUME: u8 = 50;
pub const VOLUME_STEP: i32 = 5;
pub const DEFAULT_MAX_LOAD_ATTEMPTS: u32 = 10;

/// Six hours.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_secs(6 * 60 * 60);

pub const REFRESH_ALARM_PREFIX: &str = "refreshAlarm_";
pub const IFRAME_CONNECT_REQUEST: &str = "youTubeIFrameConnectRequest";
pub const PREFERENCES_KEY: &str = "Player";

/// Playback state as reported by the external player.
///
/// The engine never sets this from user commands. It mirrors the adapter once ready and only
/// corrects it from lower level observations (seeking telemetry, loading finishing while the
/// adapter is still not ready).
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerState {
    /// Nothing has been loaded yet, or the player has been reset.
    #[default]
    Unstarted = 0x00,
    /// A song is loaded but not progressing.
    Paused = 0x01,
    /// Playback is stalled waiting for data, usually right after a seek.
    Buffering = 0x02,
    /// Playback is in progress.
    Playing = 0x03,
}

impl PlayerState {
    /// Playing and Buffering both mean the session is in active use.
    pub fn is_active(self) -> bool {
        matches!(self, PlayerState::Playing | PlayerState::Buffering)
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unstarted => write!(f, "unstarted"),
            Self::Paused => write!(f, "paused"),
            Self::Buffering => write!(f, "buffering"),
            Self::Playing => write!(f, "playing"),
        }
    }
}

/// Playback quality hint passed along with every load request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestedQuality {
    #[default]
    Default,
    Small,
    Medium,
    Large,
    Hd720,
    Hd1080,
    Highres,
}

impl SuggestedQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Hd720 => "hd720",
            Self::Hd1080 => "hd1080",
            Self::Highres => "highres",
        }
    }
}

impl fmt::Display for SuggestedQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
