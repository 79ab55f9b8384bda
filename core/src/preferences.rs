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

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;
use serde_json::{Map, Value};

use crate::errors::StoreError;
use crate::player_state::Preferences;

/// Persistent key/value storage for the user's volume and mute choice.
pub trait PreferenceStore: Send + Sync {
    /// `Ok(None)` when nothing was ever saved.
    fn load(&self) -> Result<Option<Preferences>, StoreError>;
    fn save(&self, preferences: &Preferences) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryPreferenceStore {
    stored: Mutex<Option<Preferences>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferences(preferences: Preferences) -> Self {
        Self { stored: Mutex::new(Some(preferences)) }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Option<Preferences>, StoreError> {
        Ok(*self.stored.lock().map_err(|_| StoreError::Poisoned)?)
    }

    fn save(&self, preferences: &Preferences) -> Result<(), StoreError> {
        *self.stored.lock().map_err(|_| StoreError::Poisoned)? = Some(*preferences);
        Ok(())
    }
}

/// Keeps records in a JSON object file, one entry per key, leaving other keys untouched.
pub struct JsonFilePreferenceStore {
    path: PathBuf,
    key: String,
    lock: Mutex<()>,
}

impl JsonFilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self) -> Result<Map<String, Value>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Map::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn load(&self) -> Result<Option<Preferences>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut records = self.read_records()?;
        match records.remove(&self.key) {
            Some(record) => Ok(Some(serde_json::from_value(record)?)),
            None => Ok(None),
        }
    }

    fn save(&self, preferences: &Preferences) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut records = self.read_records()?;
        records.insert(self.key.clone(), serde_json::to_value(preferences)?);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&records)?)?;
        debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }
}
