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

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use futures::channel::mpsc as port;
use log::{debug, info, warn};
use playsync_core::{
    run_player_watch, spawn_service, EngineConfig, EngineEvent, IFrameMessage, Ingestion, JsonFilePreferenceStore,
    MultiServiceHandle, Player, PlayerSettings, PlayerStateEngine, ServiceHandle, TokioAlarmScheduler,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::select;
use tokio::sync::broadcast;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::protocol::{HostMessage, HostOutput};
use crate::stdio_player::StdioPlayerAdapter;

pub struct HostOptions {
    pub config: EngineConfig,
    pub settings: PlayerSettings,
    pub state_file: PathBuf,
}

struct TelemetryPort {
    messages: port::UnboundedSender<IFrameMessage>,
    _forwarder: ServiceHandle,
}

/// Writes every output as one JSON line until all senders are gone.
pub async fn write_outputs<W>(mut writer: W, mut outputs: UnboundedReceiver<HostOutput>) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(output) = outputs.recv().await {
        let mut line = serde_json::to_vec(&output)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}

fn forward_engine_events(mut events: broadcast::Receiver<EngineEvent>, output: UnboundedSender<HostOutput>) -> ServiceHandle {
    spawn_service(move |mut stop| async move {
        loop {
            select! {
                _ = stop.signaled() => break,
                event = events.recv() => match event {
                    Ok(event) => {
                        if output.send(HostOutput::from(event)).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Engine events lagged by {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    })
}

/// Runs the engine and its collaborators, feeding it from `input` until end of input.
pub async fn run_host<R>(options: HostOptions, input: R, output: UnboundedSender<HostOutput>) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let (inbox, inbox_rx) = unbounded_channel();
    let adapter = Arc::new(StdioPlayerAdapter::new(output.clone()));
    let player = Player::new(adapter.clone());
    let alarms = Arc::new(TokioAlarmScheduler::new(inbox.clone()));
    let store = Arc::new(JsonFilePreferenceStore::new(&options.state_file, options.config.preferences_key.clone()));
    let ingestion = Ingestion::new(inbox.clone(), options.config.telemetry_port_name.clone());

    let engine = PlayerStateEngine::new(options.config, player.clone(), alarms, store).with_settings(options.settings);
    let mut services = MultiServiceHandle::new();
    services.add(forward_engine_events(engine.subscribe(), output));
    services.add(run_player_watch(player, inbox.clone()).await?);
    services.add(engine.run(inbox_rx));
    info!("Host started");

    let mut ports: HashMap<String, TelemetryPort> = HashMap::new();
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let message = match serde_json::from_str::<HostMessage>(&line) {
            Ok(message) => message,
            Err(e) => {
                warn!("Ignoring malformed message: {}", e);
                continue;
            }
        };
        dispatch(message, &ingestion, &adapter, &mut ports).await?;
    }

    info!("Input closed, stopping host");
    // Dropping a port closes its stream, which ends the forwarder.
    ports.clear();
    services.shutdown().await?;
    Ok(())
}

async fn dispatch(
    message: HostMessage,
    ingestion: &Ingestion,
    adapter: &StdioPlayerAdapter,
    ports: &mut HashMap<String, TelemetryPort>,
) -> anyhow::Result<()> {
    match message {
        HostMessage::Command { name } => {
            if let Err(e) = ingestion.on_command(&name) {
                debug!("{}", e);
            }
        }
        HostMessage::Alarm { name } => ingestion.on_alarm(&name)?,
        HostMessage::Connect { port: name } => {
            let (messages, messages_rx) = port::unbounded();
            if let Some(forwarder) = ingestion.on_connect(&name, messages_rx) {
                ports.insert(name, TelemetryPort { messages, _forwarder: forwarder });
            }
        }
        HostMessage::Disconnect { port: name } => {
            if ports.remove(&name).is_none() {
                debug!("Disconnect for unknown port {}", name);
            }
        }
        HostMessage::PortMessage { port: name, message } => match ports.get(&name) {
            Some(port) => {
                if port.messages.unbounded_send(message).is_err() {
                    ports.remove(&name);
                }
            }
            None => debug!("Message for unconnected port {}", name),
        },
        HostMessage::Adapter { event } => adapter.deliver(event).await,
        other => {
            if let Some(input) = other.into_input() {
                ingestion.submit(input)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use playsync_core::player::{LoadRequest, PlayerCommand};
    use playsync_core::definitions::SuggestedQuality;
    use std::time::Duration;
    use tokio::io::BufReader;
    use tokio::time::timeout;

    async fn wait_for(outputs: &mut UnboundedReceiver<HostOutput>, expected: &HostOutput) {
        loop {
            let output = timeout(Duration::from_secs(2), outputs.recv()).await.unwrap().unwrap();
            if &output == expected {
                return;
            }
        }
    }

    #[tokio::test]
    async fn activation_flows_from_stdin_to_adapter_commands() {
        let dir = tempfile::tempdir().unwrap();
        let options = HostOptions {
            config: EngineConfig::default(),
            settings: PlayerSettings::default(),
            state_file: dir.path().join("state.json"),
        };
        let (mut stdin, stdin_rx) = tokio::io::duplex(4096);
        let (output, mut outputs) = unbounded_channel();
        let host = tokio::spawn(run_host(options, BufReader::new(stdin_rx), output));

        stdin.write_all(b"{\"type\":\"activateSong\",\"songId\":\"abc\",\"startSeconds\":5}\n").await.unwrap();
        stdin.write_all(b"not json\n").await.unwrap();
        stdin.write_all(b"{\"type\":\"adapter\",\"event\":{\"kind\":\"readyChanged\",\"value\":true}}\n").await.unwrap();

        let cue = HostOutput::AdapterCommand {
            command: PlayerCommand::CueVideoById(LoadRequest {
                video_id: "abc".into(),
                start_seconds: 0.0,
                suggested_quality: SuggestedQuality::Default,
            }),
        };
        wait_for(&mut outputs, &cue).await;

        stdin.write_all(b"{\"type\":\"watchInTab\",\"songId\":\"abc\",\"url\":\"https://youtu.be/abc\"}\n").await.unwrap();
        wait_for(&mut outputs, &HostOutput::OpenTab { url: "https://youtu.be/abc?t=0s".into() }).await;

        stdin.write_all(b"{\"type\":\"setVolume\",\"volume\":75.4}\n").await.unwrap();
        wait_for(&mut outputs, &HostOutput::AdapterCommand { command: PlayerCommand::SetVolume(75) }).await;

        drop(stdin);
        timeout(Duration::from_secs(2), host).await.unwrap().unwrap().unwrap();
        let saved = std::fs::read_to_string(dir.path().join("state.json")).unwrap();
        assert!(saved.contains("\"volume\": 75"));
    }

    #[tokio::test]
    async fn outputs_are_json_lines() {
        let (tx, rx) = unbounded_channel();
        tx.send(HostOutput::OpenTab { url: "u".into() }).unwrap();
        drop(tx);
        let mut buffer = Vec::new();
        write_outputs(&mut buffer, rx).await.unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "{\"type\":\"openTab\",\"url\":\"u\"}\n");
    }
}
