// Example showing how to wire PlayerStateEngine + TokioAlarmScheduler + player watch + Ingestion
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use playsync_core::player::{AdapterEvent, AdapterSnapshot, LoadRequest};
use playsync_core::{
    run_player_watch, EngineConfig, Ingestion, Input, MemoryPreferenceStore, MultiServiceHandle, Player,
    PlayerAdapter, PlayerError, PlayerStateEngine, TokioAlarmScheduler,
};

/// Pretends to be an embedded player that is always ready and just logs what it is told.
struct LoggingAdapter;

#[async_trait]
impl PlayerAdapter for LoggingAdapter {
    async fn snapshot(&self) -> Result<AdapterSnapshot, PlayerError> {
        Ok(AdapterSnapshot { ready: true, ..AdapterSnapshot::default() })
    }
    async fn load_video_by_id(&self, request: &LoadRequest) -> Result<(), PlayerError> {
        info!("load {} at {}s", request.video_id, request.start_seconds);
        Ok(())
    }
    async fn cue_video_by_id(&self, request: &LoadRequest) -> Result<(), PlayerError> {
        info!("cue {} at {}s", request.video_id, request.start_seconds);
        Ok(())
    }
    async fn play(&self) -> Result<(), PlayerError> {
        info!("play");
        Ok(())
    }
    async fn pause(&self) -> Result<(), PlayerError> {
        info!("pause");
        Ok(())
    }
    async fn set_volume(&self, volume: u8) -> Result<(), PlayerError> {
        info!("volume {}", volume);
        Ok(())
    }
    async fn un_mute(&self) -> Result<(), PlayerError> {
        info!("unmute");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let (inbox, inbox_rx) = tokio::sync::mpsc::unbounded_channel();
    let player = Player::new(Arc::new(LoggingAdapter));
    let config = EngineConfig {
        refresh_delay: Duration::from_secs(5),
        ..EngineConfig::default()
    };
    let ingestion = Ingestion::new(inbox.clone(), config.telemetry_port_name.clone());
    let engine = PlayerStateEngine::new(
        config,
        player.clone(),
        Arc::new(TokioAlarmScheduler::new(inbox.clone())),
        Arc::new(MemoryPreferenceStore::new()),
    );
    let mut events = engine.subscribe();

    let mut services = MultiServiceHandle::new();
    services.add(run_player_watch(player, inbox.clone()).await?);
    services.add(engine.run(inbox_rx));

    ingestion.submit(Input::ActivateSong { song_id: "dQw4w9WgXcQ".into(), start_seconds: 0.0 })?;
    ingestion.on_command("increaseVolume")?;
    ingestion.submit(Input::Adapter(AdapterEvent::StateChanged(playsync_core::definitions::PlayerState::Paused)))?;

    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!("{}", serde_json::to_string(&event).unwrap_or_default());
        }
    });

    info!("Engine example running; the refresh alarm fires after 5s. Press Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;
    services.shutdown().await?;
    Ok(())
}
