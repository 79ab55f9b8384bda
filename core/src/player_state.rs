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

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::definitions::*;

bitflags! {
    /// Names the intent fields touched by a single reduction.
    #[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
    pub struct IntentFields: u16 {
        const CurrentTime = 0x0001;
        const Ready = 0x0002;
        const Loading = 0x0004;
        const LoadAttempt = 0x0008;
        const State = 0x0010;
        const Volume = 0x0020;
        const Muted = 0x0040;
        const LoadedSongId = 0x0080;
        const SongIdToActivate = 0x0100;
        const PlayOnActivate = 0x0200;
        const RefreshAlarmCreated = 0x0400;
    }
}

/// Activation requested while the adapter was not ready. Always fulfilled from the start of the
/// song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingActivation {
    pub song_id: String,
}

/// The persisted subset of the intent. Missing fields fall back to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub volume: u8,
    pub muted: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            muted: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSettings {
    pub suggested_quality: SuggestedQuality,
}

/// Canonical playback intent owned by the engine.
///
/// Fields are only written by the reducer; everyone else reads snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackIntent {
    pub(crate) loaded_song_id: Option<String>,
    pub(crate) song_to_activate: Option<PendingActivation>,
    pub(crate) current_time: f64,
    pub(crate) play_on_activate: bool,
    pub(crate) state: PlayerState,
    pub(crate) ready: bool,
    pub(crate) loading: bool,
    pub(crate) load_attempt: u32,
    pub(crate) max_load_attempts: u32,
    pub(crate) volume: u8,
    pub(crate) muted: bool,
    pub(crate) refresh_alarm_name: String,
    pub(crate) refresh_alarm_created: bool,
    pub(crate) refresh_deferred: bool,
}

impl Default for PlaybackIntent {
    fn default() -> Self {
        Self::with_alarm_name(format!("{}{}", REFRESH_ALARM_PREFIX, Uuid::new_v4()))
    }
}

impl PlaybackIntent {
    /// Every instance gets a fresh alarm name so that an alarm left behind by an earlier process
    /// is never mistaken for our own.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alarm_name(refresh_alarm_name: String) -> Self {
        Self {
            loaded_song_id: None,
            song_to_activate: None,
            current_time: 0.0,
            play_on_activate: false,
            state: PlayerState::Unstarted,
            ready: false,
            loading: false,
            load_attempt: 1,
            max_load_attempts: DEFAULT_MAX_LOAD_ATTEMPTS,
            volume: DEFAULT_VOLUME,
            muted: false,
            refresh_alarm_name,
            refresh_alarm_created: false,
            refresh_deferred: false,
        }
    }

    pub fn loaded_song_id(&self) -> Option<&str> {
        self.loaded_song_id.as_deref()
    }

    pub fn song_id_to_activate(&self) -> Option<&str> {
        self.song_to_activate.as_ref().map(|pending| pending.song_id.as_str())
    }

    pub fn pending_activation(&self) -> Option<&PendingActivation> {
        self.song_to_activate.as_ref()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn play_on_activate(&self) -> bool {
        self.play_on_activate
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn ready(&self) -> bool {
        self.ready
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn load_attempt(&self) -> u32 {
        self.load_attempt
    }

    pub fn max_load_attempts(&self) -> u32 {
        self.max_load_attempts
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn refresh_alarm_name(&self) -> &str {
        &self.refresh_alarm_name
    }

    pub fn refresh_alarm_created(&self) -> bool {
        self.refresh_alarm_created
    }

    pub fn preferences(&self) -> Preferences {
        Preferences {
            volume: self.volume,
            muted: self.muted,
        }
    }
}
