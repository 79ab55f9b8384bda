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

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use playsync_core::definitions::SuggestedQuality;
use playsync_core::{EngineConfig, PlayerSettings, WatchdogPolicy};

use crate::host::HostOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Watchdog {
    /// Arm the refresh alarm whenever playback stops progressing
    StateTransition,
    /// Arm the refresh alarm for as long as a song is loaded
    LoadedElapsed,
}

impl From<Watchdog> for WatchdogPolicy {
    fn from(watchdog: Watchdog) -> Self {
        match watchdog {
            Watchdog::StateTransition => WatchdogPolicy::StateTransition,
            Watchdog::LoadedElapsed => WatchdogPolicy::LoadedElapsed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Quality {
    Default,
    Small,
    Medium,
    Large,
    Hd720,
    Hd1080,
    Highres,
}

impl From<Quality> for SuggestedQuality {
    fn from(quality: Quality) -> Self {
        match quality {
            Quality::Default => SuggestedQuality::Default,
            Quality::Small => SuggestedQuality::Small,
            Quality::Medium => SuggestedQuality::Medium,
            Quality::Large => SuggestedQuality::Large,
            Quality::Hd720 => SuggestedQuality::Hd720,
            Quality::Hd1080 => SuggestedQuality::Hd1080,
            Quality::Highres => SuggestedQuality::Highres,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the log level
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// JSON file holding the saved volume and mute preference
    #[arg(long, default_value = "playsync_state.json")]
    pub state_file: PathBuf,

    /// Idle time after which the player session is reloaded
    #[arg(long, default_value_t = 360)]
    pub refresh_delay_minutes: u64,

    #[arg(long, value_enum, default_value_t = Watchdog::StateTransition)]
    pub watchdog: Watchdog,

    /// Quality hint passed along with every load
    #[arg(long, value_enum, default_value_t = Quality::Default)]
    pub suggested_quality: Quality,
}

impl Cli {
    pub fn host_options(&self) -> HostOptions {
        HostOptions {
            config: EngineConfig {
                refresh_delay: Duration::from_secs(self.refresh_delay_minutes * 60),
                watchdog_policy: self.watchdog.into(),
                ..EngineConfig::default()
            },
            settings: PlayerSettings {
                suggested_quality: self.suggested_quality.into(),
            },
            state_file: self.state_file.clone(),
        }
    }
}
