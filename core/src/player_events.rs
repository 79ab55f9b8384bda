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

use serde::Serialize;

use crate::player_state::{IntentFields, PlaybackIntent};

/// Events emitted by the engine for UI and other outside consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EngineEvent {
    /// The adapter reported a playback error. Emitted once per occurrence, never retried.
    PlaybackError { message: String },

    /// The telemetry channel reported an error from inside the player frame.
    TelemetryError { message: String },

    /// One or more intent fields changed. Carries the intent as it is after the change.
    IntentChanged {
        #[serde(serialize_with = "serialize_fields")]
        fields: IntentFields,
        intent: PlaybackIntent,
    },

    /// The host should open `url` in a new tab.
    OpenTab { url: String },
}

fn serialize_fields<S: serde::Serializer>(fields: &IntentFields, serializer: S) -> Result<S::Ok, S::Error> {
    let names: Vec<&str> = fields.iter_names().map(|(name, _)| name).collect();
    names.serialize(serializer)
}
