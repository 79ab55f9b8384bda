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

use std::io;
use thiserror::Error;

/// Error type for preference persistence
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed preferences: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Preference store lock poisoned")]
    Poisoned,
}

/// Error type for inbound messages that cannot be turned into engine inputs
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IngestError {
    /// The command name is not one of the recognised keyboard commands.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The engine loop has stopped and no longer accepts inputs.
    #[error("Engine is no longer running")]
    EngineGone,
}
