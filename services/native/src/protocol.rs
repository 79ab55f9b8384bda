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

//! Line-delimited JSON messages exchanged with the browser side over stdio.

use playsync_core::definitions::SuggestedQuality;
use playsync_core::player::{AdapterEvent, PlayerCommand};
use playsync_core::{EngineEvent, IFrameMessage, Input};
use serde::{Deserialize, Serialize};

/// Messages read from stdin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostMessage {
    Command { name: String },
    Alarm { name: String },
    Connect { port: String },
    Disconnect { port: String },
    PortMessage { port: String, message: IFrameMessage },
    Adapter { event: AdapterEvent },
    ActivateSong {
        song_id: String,
        #[serde(default)]
        start_seconds: f64,
    },
    ToggleState,
    SetVolume { volume: f64 },
    SetMuted { muted: bool },
    Play,
    Pause,
    Stop,
    SeekTo { seconds: f64 },
    Refresh,
    WatchInTab { song_id: String, url: String },
    SuggestedQuality { quality: SuggestedQuality },
}

impl HostMessage {
    /// Messages that map one-to-one onto an engine input. Routing messages return `None`.
    pub fn into_input(self) -> Option<Input> {
        let input = match self {
            Self::ActivateSong { song_id, start_seconds } => Input::ActivateSong { song_id, start_seconds },
            Self::ToggleState => Input::ToggleState,
            Self::SetVolume { volume } => Input::SetVolume(volume),
            Self::SetMuted { muted } => Input::SetMuted(muted),
            Self::Play => Input::Play,
            Self::Pause => Input::Pause,
            Self::Stop => Input::Stop,
            Self::SeekTo { seconds } => Input::SeekTo(seconds),
            Self::Refresh => Input::Refresh,
            Self::WatchInTab { song_id, url } => Input::WatchInTab { song_id, url },
            Self::SuggestedQuality { quality } => Input::SetSuggestedQuality(quality),
            Self::Command { .. }
            | Self::Alarm { .. }
            | Self::Connect { .. }
            | Self::Disconnect { .. }
            | Self::PortMessage { .. }
            | Self::Adapter { .. } => return None,
        };
        Some(input)
    }
}

/// Messages written to stdout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostOutput {
    AdapterCommand { command: PlayerCommand },
    Event { event: EngineEvent },
    OpenTab { url: String },
}

impl From<EngineEvent> for HostOutput {
    fn from(event: EngineEvent) -> Self {
        match event {
            EngineEvent::OpenTab { url } => HostOutput::OpenTab { url },
            event => HostOutput::Event { event },
        }
    }
}
