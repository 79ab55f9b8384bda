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

use futures::channel::mpsc::{SendError, Sender};
use futures::{SinkExt, StreamExt};
use log::{debug, error};
use tokio::select;
use tokio::sync::mpsc::UnboundedSender;

use crate::player::{AdapterEvent, AdapterSnapshot, Player, PlayerAdapter, PlayerError, PlayerEventListener};
use crate::reducer::Input;
use crate::service::{spawn_service, ServiceHandle};

const SNAPSHOT_POLL_INTERVAL: Duration = Duration::from_millis(100);

async fn update_snapshot(new: &AdapterSnapshot, current: &mut AdapterSnapshot, tx: &mut Sender<AdapterEvent>)
    -> Result<(), SendError>
{
    if new.ready != current.ready {
        current.ready = new.ready;
        tx.send(AdapterEvent::ReadyChanged(new.ready)).await?;
    }
    if new.loading != current.loading {
        current.loading = new.loading;
        tx.send(AdapterEvent::LoadingChanged(new.loading)).await?;
    }
    if new.load_attempt != current.load_attempt {
        current.load_attempt = new.load_attempt;
        tx.send(AdapterEvent::LoadAttemptChanged(new.load_attempt)).await?;
    }
    Ok(())
}

/// For adapters without push notifications: diff the snapshot periodically.
fn create_polling_snapshot_watch(player: Player) -> PlayerEventListener {
    let (mut tx, rx) = futures::channel::mpsc::channel(30);
    tokio::spawn(async move {
        let mut current = AdapterSnapshot::default();
        while !tx.is_closed() {
            match player.snapshot().await {
                Ok(snapshot) => {
                    if let Err(e) = update_snapshot(&snapshot, &mut current, &mut tx).await {
                        if e.is_disconnected() {
                            break;
                        }
                        error!("Failed to send snapshot changes to channel: {}", e);
                    }
                }
                Err(e) => {
                    debug!("Snapshot polling stopped: {}", e);
                    break;
                }
            }
            tokio::time::sleep(SNAPSHOT_POLL_INTERVAL).await;
        }
    });
    rx
}

async fn get_adapter_notification_stream(player: Player) -> Result<PlayerEventListener, PlayerError> {
    match player.listen_to_player_notifications().await {
        Ok(listener) => Ok(listener),
        Err(PlayerError::FeatureNotSupported) => Ok(create_polling_snapshot_watch(player)),
        Err(e) => Err(e),
    }
}

/// Forwards adapter notifications into the engine inbox until stopped or the adapter goes away.
pub async fn run_player_watch(player: Player, inbox: UnboundedSender<Input>) -> Result<ServiceHandle, PlayerError> {
    let mut notifications = get_adapter_notification_stream(player).await?;
    Ok(spawn_service(move |mut stop| async move {
        loop {
            select! {
                _ = stop.signaled() => break,
                event = notifications.next() => match event {
                    Some(event) => {
                        if inbox.send(Input::Adapter(event)).is_err() {
                            break;
                        }
                    }
                    None => {
                        debug!("Player notification stream ended");
                        break;
                    }
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    struct PushAdapter {
        listener: Mutex<Option<PlayerEventListener>>,
    }

    #[async_trait]
    impl PlayerAdapter for PushAdapter {
        async fn listen_to_player_notifications(&self) -> Result<PlayerEventListener, PlayerError> {
            self.listener.lock().unwrap().take().ok_or(PlayerError::NotReady)
        }
    }

    struct PollOnlyAdapter;

    #[async_trait]
    impl PlayerAdapter for PollOnlyAdapter {
        async fn snapshot(&self) -> Result<AdapterSnapshot, PlayerError> {
            Ok(AdapterSnapshot { ready: true, loading: false, load_attempt: 3 })
        }
    }

    #[tokio::test]
    async fn forwards_pushed_notifications() {
        let (mut tx, rx) = futures::channel::mpsc::channel(4);
        let player = Player::new(Arc::new(PushAdapter { listener: Mutex::new(Some(rx)) }));
        let (inbox, mut inbox_rx) = mpsc::unbounded_channel();
        let handle = run_player_watch(player, inbox).await.unwrap();

        tx.send(AdapterEvent::StateChanged(crate::definitions::PlayerState::Playing)).await.unwrap();
        assert_eq!(
            inbox_rx.recv().await,
            Some(Input::Adapter(AdapterEvent::StateChanged(crate::definitions::PlayerState::Playing)))
        );
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn falls_back_to_polling_snapshots() {
        let player = Player::new(Arc::new(PollOnlyAdapter));
        let (inbox, mut inbox_rx) = mpsc::unbounded_channel();
        let handle = run_player_watch(player, inbox).await.unwrap();

        let first = timeout(Duration::from_secs(1), inbox_rx.recv()).await.unwrap();
        let second = timeout(Duration::from_secs(1), inbox_rx.recv()).await.unwrap();
        assert_eq!(first, Some(Input::Adapter(AdapterEvent::ReadyChanged(true))));
        assert_eq!(second, Some(Input::Adapter(AdapterEvent::LoadAttemptChanged(3))));
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn listener_errors_are_returned() {
        let player = Player::new(Arc::new(PushAdapter { listener: Mutex::new(None) }));
        let (inbox, _inbox_rx) = mpsc::unbounded_channel();
        assert!(matches!(run_player_watch(player, inbox).await, Err(PlayerError::NotReady)));
    }
}
