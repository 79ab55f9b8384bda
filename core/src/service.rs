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

//! Background task plumbing shared by the engine loop, the adapter watch and the telemetry ports.

use std::future::Future;

use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};

/// Given to every background task so it can notice a stop request inside `select!`.
pub struct StopHandle {
    shutdown_rx: oneshot::Receiver<()>,
}

impl StopHandle {
    fn new(shutdown_rx: oneshot::Receiver<()>) -> Self {
        Self { shutdown_rx }
    }

    /// Resolves once a stop was requested or the owning [`ServiceHandle`] was dropped.
    ///
    /// ```rust
    /// use playsync_core::spawn_service;
    ///
    /// async fn run() {
    ///     let handle = spawn_service(|mut stop| async move {
    ///         stop.signaled().await;
    ///     });
    ///     handle.shutdown().await.unwrap();
    /// }
    /// ```
    pub async fn signaled(&mut self) {
        (&mut self.shutdown_rx).await.unwrap_or_default();
    }
}

/// Owner side of a background task spawned with [`spawn_service`].
pub struct ServiceHandle {
    join: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ServiceHandle {
    pub fn new(join: JoinHandle<()>, shutdown_tx: oneshot::Sender<()>) -> Self {
        Self { join, shutdown_tx: Some(shutdown_tx) }
    }

    /// Signals the task without waiting for it.
    pub fn request_shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn await_join(self) -> Result<(), JoinError> {
        self.join.await
    }

    pub async fn shutdown(mut self) -> Result<(), JoinError> {
        self.request_shutdown();
        self.await_join().await
    }

    pub fn abort(self) {
        self.join.abort();
    }
}

/// Spawns `f` on the Tokio runtime, handing it a [`StopHandle`].
pub fn spawn_service<Fut, Func>(f: Func) -> ServiceHandle
where
    Fut: Future<Output = ()> + Send + 'static,
    Func: FnOnce(StopHandle) -> Fut + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let stop = StopHandle::new(shutdown_rx);
    let join = tokio::spawn(async move {
        f(stop).await;
    });
    ServiceHandle::new(join, shutdown_tx)
}

/// Several services stopped together, in the order they were added.
#[derive(Default)]
pub struct MultiServiceHandle {
    handles: Vec<ServiceHandle>,
}

impl MultiServiceHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, handle: ServiceHandle) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Signals every service first, then joins them all. Reports the first join failure.
    pub async fn shutdown(mut self) -> Result<(), JoinError> {
        for handle in &mut self.handles {
            handle.request_shutdown();
        }
        let mut first_err = None;
        for handle in self.handles {
            if let Err(e) = handle.await_join().await {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
