// Copyright 2023 drey7925
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
//
// SPDX-License-Identifier: Apache-2.0

use std::{fs::create_dir_all, path::{Path, PathBuf}, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const SETTINGS_RON_FILE: &str = "settings.ron";

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("rocks", "drey7925", "mcpb").context("couldn't find config dir")
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct EntitySettings {
    /// How long a fetched position/orientation/world stays valid before it is queried again.
    pub cache_entity_time: Duration,
    /// Swallow entity-not-found on operations against unloaded or dead entities.
    pub allow_unloaded_entity_ops: bool,
    pub cache_player_time: Duration,
    /// Swallow player-not-found on operations against offline players.
    pub allow_offline_player_ops: bool,
}

impl Default for EntitySettings {
    fn default() -> Self {
        Self {
            cache_entity_time: Duration::from_millis(200),
            allow_unloaded_entity_ops: true,
            cache_player_time: Duration::from_millis(200),
            allow_offline_player_ops: true,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct EventSettings {
    /// Maximum number of events returned by the `poll_*` shortcuts.
    pub poll_default: Option<usize>,
    /// Backlog per event type. Newer events are dropped once it is full.
    pub max_queue_size: usize,
    pub warn_dropped_interval: Duration,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            poll_default: Some(10),
            max_queue_size: 100,
            warn_dropped_interval: Duration::from_secs(30),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct ClientSettings {
    pub host: String,
    pub port: u16,
    pub entities: EntitySettings,
    pub events: EventSettings,
    /// Largest number of positions sent in a single setBlocks call.
    pub max_blocks: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            host: mcpb_core::DEFAULT_HOST.to_string(),
            port: mcpb_core::DEFAULT_PORT,
            entities: Default::default(),
            events: Default::default(),
            max_blocks: 50000,
        }
    }
}

impl ClientSettings {
    pub fn default_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join(SETTINGS_RON_FILE))
    }

    pub fn save_to(&self, config_file: &Path) -> Result<()> {
        if let Some(config_dir) = config_file.parent() {
            if !config_dir.exists() {
                create_dir_all(config_dir)?;
            }
        }
        let config = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(config_file, config)?;
        log::info!("Saved settings to {}", config_file.display());
        Ok(())
    }

    pub fn load_from(config_file: &Path) -> Result<Option<Self>> {
        if !config_file.exists() {
            log::warn!("No settings found at {}", config_file.display());
            return Ok(None);
        }
        let config = std::fs::read_to_string(config_file)?;
        let parsed = ron::from_str(&config)
            .with_context(|| format!("parsing {}", config_file.display()))?;
        log::info!("Loaded settings from {}", config_file.display());
        Ok(Some(parsed))
    }

    pub fn save_to_disk(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Settings from the platform config dir, or the defaults if there are none.
    pub fn load_from_disk() -> Result<Self> {
        Ok(Self::load_from(&Self::default_path()?)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_RON_FILE);
        assert_eq!(ClientSettings::load_from(&path).unwrap(), None);

        let mut settings = ClientSettings::default();
        settings.port = 1790;
        settings.events.poll_default = None;
        settings.entities.cache_entity_time = Duration::from_secs(1);
        settings.save_to(&path).unwrap();
        assert_eq!(ClientSettings::load_from(&path).unwrap(), Some(settings));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_RON_FILE);
        std::fs::write(&path, "(max_blocks: 10)").unwrap();
        let settings = ClientSettings::load_from(&path).unwrap().unwrap();
        assert_eq!(settings.max_blocks, 10);
        assert_eq!(settings.port, 1789);
        assert_eq!(settings.events.max_queue_size, 100);
    }
}
