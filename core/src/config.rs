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

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::definitions::*;

/// Decides when the refresh alarm is armed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WatchdogPolicy {
    /// Armed whenever the state leaves Playing/Buffering, cancelled when it returns.
    #[default]
    StateTransition,
    /// Armed for as long as a song is loaded, whatever the state. A firing during playback is
    /// held back until playback stops progressing.
    LoadedElapsed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub refresh_delay: Duration,
    pub watchdog_policy: WatchdogPolicy,
    pub min_volume: u8,
    pub max_volume: u8,
    pub default_volume: u8,
    pub volume_step: i32,
    pub max_load_attempts: u32,
    pub telemetry_port_name: String,
    pub preferences_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_delay: DEFAULT_REFRESH_DELAY,
            watchdog_policy: WatchdogPolicy::default(),
            min_volume: MIN_VOLUME,
            max_volume: MAX_VOLUME,
            default_volume: DEFAULT_VOLUME,
            volume_step: VOLUME_STEP,
            max_load_attempts: DEFAULT_MAX_LOAD_ATTEMPTS,
            telemetry_port_name: IFRAME_CONNECT_REQUEST.to_string(),
            preferences_key: PREFERENCES_KEY.to_string(),
        }
    }
}

impl EngineConfig {
    /// Rounds to a whole step and clamps to the configured bounds, whichever order they were
    /// given in. NaN maps to the lower bound.
    pub fn clamp_volume(&self, volume: f64) -> u8 {
        let (low, high) = if self.min_volume <= self.max_volume {
            (self.min_volume, self.max_volume)
        } else {
            (self.max_volume, self.min_volume)
        };
        if volume.is_nan() {
            return low;
        }
        volume.round().clamp(low as f64, high as f64) as u8
    }
}
