pub mod alarms;
pub mod config;
pub mod definitions;
pub mod engine;
pub mod errors;
pub mod ingest;
pub mod player;
pub mod player_events;
pub mod player_state;
pub mod preferences;
pub mod reducer;

mod player_watch;
mod service;

pub use alarms::{AlarmScheduler, TokioAlarmScheduler};
pub use config::{EngineConfig, WatchdogPolicy};
pub use engine::PlayerStateEngine;
pub use errors::{IngestError, StoreError};
pub use ingest::{HostCommand, IFrameMessage, Ingestion};
pub use player::{Player, PlayerAdapter, PlayerError};
pub use player_events::EngineEvent;
pub use player_state::{PlaybackIntent, PlayerSettings, Preferences};
pub use player_watch::run_player_watch;
pub use preferences::{JsonFilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use reducer::Input;
pub use service::{spawn_service, MultiServiceHandle, ServiceHandle, StopHandle};
