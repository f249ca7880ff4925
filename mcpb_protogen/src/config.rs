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

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{io_err, ProtogenError, Result};

/// Where the plugin project publishes its interface definition.
pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/icezyclon/mcproto/main/src/main/proto/minecraft.proto";

pub const CONFIG_RON_FILE: &str = "protogen.ron";

/// One output tree of generated stubs.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct GenerationTarget {
    pub name: String,
    pub out_dir: PathBuf,
    pub build_client: bool,
    pub build_server: bool,
}

impl Default for GenerationTarget {
    fn default() -> Self {
        Self {
            name: String::from("mcpb"),
            out_dir: PathBuf::from("target/protogen/mcpb"),
            build_client: true,
            build_server: false,
        }
    }
}

/// Paths are relative to the working directory of the process.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ProtogenConfig {
    pub source_url: String,
    pub proto_path: PathBuf,
    pub lock_path: PathBuf,
    pub targets: Vec<GenerationTarget>,
}

impl Default for ProtogenConfig {
    fn default() -> Self {
        Self {
            source_url: String::from(DEFAULT_SOURCE_URL),
            proto_path: PathBuf::from("mcpb_core/proto/minecraft.proto"),
            lock_path: PathBuf::from("mcpb_core/proto/minecraft.proto.sha256"),
            targets: vec![
                GenerationTarget::default(),
                GenerationTarget {
                    name: String::from("mcproto"),
                    out_dir: PathBuf::from("target/protogen/mcproto"),
                    ..Default::default()
                },
            ],
        }
    }
}

impl ProtogenConfig {
    /// Loads a RON config. A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Default::default());
        }
        let contents = std::fs::read_to_string(path).map_err(io_err(path))?;
        let parsed = ron::from_str(&contents).map_err(|e| ProtogenError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(parsed)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ProtogenError::Config {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        std::fs::write(path, config).map_err(io_err(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProtogenConfig::load(&dir.path().join(CONFIG_RON_FILE)).unwrap();
        assert_eq!(config, ProtogenConfig::default());
        assert_eq!(config.targets.len(), 2);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_RON_FILE);
        std::fs::write(
            &path,
            r#"(source_url: "https://example.invalid/minecraft.proto", targets: [(name: "only")])"#,
        )
        .unwrap();
        let config = ProtogenConfig::load(&path).unwrap();
        assert_eq!(config.source_url, "https://example.invalid/minecraft.proto");
        assert_eq!(config.proto_path, ProtogenConfig::default().proto_path);
        assert_eq!(config.targets.len(), 1);
        assert_eq!(config.targets[0].name, "only");
        assert!(config.targets[0].build_client);
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_RON_FILE);
        std::fs::write(&path, "(source_url: ").unwrap();
        assert!(matches!(
            ProtogenConfig::load(&path).unwrap_err(),
            ProtogenError::Config { .. }
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_RON_FILE);
        let mut config = ProtogenConfig::default();
        config.targets.truncate(1);
        config.save(&path).unwrap();
        assert_eq!(ProtogenConfig::load(&path).unwrap(), config);
    }
}
