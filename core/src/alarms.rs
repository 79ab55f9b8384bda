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
use std::sync::Mutex;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::reducer::Input;

/// Named one-shot timers. Scheduling a name that is already pending replaces it.
pub trait AlarmScheduler: Send + Sync {
    fn schedule_once(&self, name: &str, delay: Duration);
    fn cancel(&self, name: &str);
}

/// Alarms backed by Tokio sleeps. A firing is delivered to the engine inbox as
/// [`Input::AlarmFired`].
pub struct TokioAlarmScheduler {
    inbox: UnboundedSender<Input>,
    pending: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TokioAlarmScheduler {
    pub fn new(inbox: UnboundedSender<Input>) -> Self {
        Self {
            inbox,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn pending_count(&self) -> usize {
        match self.pending.lock() {
            Ok(pending) => pending.values().filter(|task| !task.is_finished()).count(),
            Err(_) => 0,
        }
    }
}

impl AlarmScheduler for TokioAlarmScheduler {
    fn schedule_once(&self, name: &str, delay: Duration) {
        let Ok(mut pending) = self.pending.lock() else {
            warn!("Alarm table poisoned, dropping alarm {}", name);
            return;
        };
        pending.retain(|_, task| !task.is_finished());

        let inbox = self.inbox.clone();
        let alarm_name = name.to_string();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!("Alarm {} fired", alarm_name);
            if inbox.send(Input::AlarmFired(alarm_name)).is_err() {
                debug!("Engine gone, alarm dropped");
            }
        });
        if let Some(previous) = pending.insert(name.to_string(), task) {
            previous.abort();
        }
    }

    fn cancel(&self, name: &str) {
        let Ok(mut pending) = self.pending.lock() else {
            return;
        };
        if let Some(task) = pending.remove(name) {
            task.abort();
        }
    }
}

impl Drop for TokioAlarmScheduler {
    fn drop(&mut self) {
        if let Ok(pending) = self.pending.get_mut() {
            for (_, task) in pending.drain() {
                task.abort();
            }
        }
    }
}
