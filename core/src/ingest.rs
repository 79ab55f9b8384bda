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

//! Translation of host-side triggers (keyboard commands, alarms, telemetry ports) into engine
//! inputs.

use std::str::FromStr;

use futures::{Stream, StreamExt};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::select;
use tokio::sync::mpsc::UnboundedSender;

use crate::errors::IngestError;
use crate::reducer::Input;
use crate::service::{spawn_service, ServiceHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    IncreaseVolume,
    DecreaseVolume,
}

impl FromStr for HostCommand {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increaseVolume" => Ok(Self::IncreaseVolume),
            "decreaseVolume" => Ok(Self::DecreaseVolume),
            other => Err(IngestError::UnknownCommand(other.to_string())),
        }
    }
}

/// One message from the script running inside the player frame. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IFrameMessage {
    pub current_time: Option<f64>,
    pub seeking: Option<bool>,
    pub error: Option<String>,
}

/// Entry point for everything the host hands to the engine.
#[derive(Clone)]
pub struct Ingestion {
    inbox: UnboundedSender<Input>,
    port_name: String,
}

impl Ingestion {
    pub fn new(inbox: UnboundedSender<Input>, port_name: impl Into<String>) -> Self {
        Self {
            inbox,
            port_name: port_name.into(),
        }
    }

    pub fn submit(&self, input: Input) -> Result<(), IngestError> {
        self.inbox.send(input).map_err(|_| IngestError::EngineGone)
    }

    /// Unrecognised commands are reported back and leave the engine untouched.
    pub fn on_command(&self, command: &str) -> Result<(), IngestError> {
        let command = command.parse::<HostCommand>()?;
        self.submit(Input::Command(command))
    }

    pub fn on_alarm(&self, name: &str) -> Result<(), IngestError> {
        self.submit(Input::AlarmFired(name.to_string()))
    }

    pub fn accepts_port(&self, port_name: &str) -> bool {
        port_name == self.port_name
    }

    /// Starts forwarding telemetry from a newly connected port. Ports with any other name are
    /// ignored and `None` is returned. The forwarder ends when the port disconnects.
    pub fn on_connect<S>(&self, port_name: &str, mut messages: S) -> Option<ServiceHandle>
    where
        S: Stream<Item = IFrameMessage> + Send + Unpin + 'static,
    {
        if !self.accepts_port(port_name) {
            debug!("Ignoring connection on port {}", port_name);
            return None;
        }

        info!("Telemetry port {} connected", port_name);
        let inbox = self.inbox.clone();
        Some(spawn_service(move |mut stop| async move {
            loop {
                select! {
                    _ = stop.signaled() => break,
                    message = messages.next() => match message {
                        Some(message) => {
                            if inbox.send(Input::Telemetry(message)).is_err() {
                                break;
                            }
                        }
                        None => {
                            debug!("Telemetry port disconnected");
                            break;
                        }
                    }
                }
            }
        }))
    }
}
