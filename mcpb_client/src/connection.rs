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

use std::sync::Arc;

use mcpb_core::{
    check_status,
    protocol::{minecraft_client::MinecraftClient, ChatPostRequest, CommandRequest, WorldRequest},
    StatusError,
};
use parking_lot::{Mutex, RwLock};
use tonic::transport::Channel;

use crate::{
    cache::SingletonCache,
    entity::{Entity, EntityInner},
    error::Result,
    player::Player,
    settings::ClientSettings,
    world::{normalize_world_key, WorldData},
};

/// Shared state behind every handle that talks to one plugin.
pub(crate) struct ConnectionInner {
    client: MinecraftClient<Channel>,
    host: String,
    port: u16,
    settings: ClientSettings,
    worlds: RwLock<Vec<Arc<WorldData>>>,
    entities: SingletonCache<String, EntityInner>,
    players: SingletonCache<String, EntityInner>,
    default_player: Mutex<Option<String>>,
}

#[derive(Clone)]
pub(crate) struct Connection {
    inner: Arc<ConnectionInner>,
}

impl Connection {
    pub(crate) async fn connect(settings: ClientSettings) -> Result<Self> {
        let addr = format!("http://{}:{}", settings.host, settings.port);
        log::info!("Connecting to {}", addr);
        let client = MinecraftClient::connect(addr).await?;
        log::info!("Connected to {}:{}", settings.host, settings.port);
        Ok(Self {
            inner: Arc::new(ConnectionInner {
                client,
                host: settings.host.clone(),
                port: settings.port,
                settings,
                worlds: RwLock::new(Vec::new()),
                entities: SingletonCache::new(),
                players: SingletonCache::new(),
                default_player: Mutex::new(None),
            }),
        })
    }

    /// tonic clients are cheap to clone and every call needs its own `&mut`.
    pub(crate) fn client(&self) -> MinecraftClient<Channel> {
        self.inner.client.clone()
    }

    pub(crate) fn host(&self) -> &str {
        &self.inner.host
    }

    pub(crate) fn port(&self) -> u16 {
        self.inner.port
    }

    pub(crate) fn settings(&self) -> &ClientSettings {
        &self.inner.settings
    }

    pub(crate) fn same_as(&self, other: &Connection) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) async fn run_command(&self, command: String) -> Result<()> {
        log::debug!("runCommand: {}", command);
        let status = self
            .client()
            .run_command(CommandRequest { command })
            .await?
            .into_inner();
        check_status(Some(&status))?;
        Ok(())
    }

    pub(crate) async fn post_to_chat(&self, message: String) -> Result<()> {
        let status = self
            .client()
            .post_to_chat(ChatPostRequest { message })
            .await?
            .into_inner();
        check_status(Some(&status))?;
        Ok(())
    }

    /// Reloads the world list. Worlds that are still there keep their identity unless `remake`
    /// is set.
    pub(crate) async fn refresh_worlds(&self, remake: bool) -> Result<Vec<Arc<WorldData>>> {
        let response = self
            .client()
            .access_worlds(WorldRequest { worlds: vec![] })
            .await?
            .into_inner();
        check_status(response.status.as_ref())?;

        let mut worlds = self.inner.worlds.write();
        let refreshed: Vec<_> = response
            .worlds
            .into_iter()
            .map(|world| {
                let key = world.info.map(|info| info.key).unwrap_or_default();
                let existing = worlds
                    .iter()
                    .find(|w| w.name == world.name && w.key == key)
                    .filter(|_| !remake);
                match existing {
                    Some(existing) => existing.clone(),
                    None => Arc::new(WorldData {
                        name: world.name,
                        key,
                    }),
                }
            })
            .collect();
        log::debug!("Refreshed {} worlds", refreshed.len());
        *worlds = refreshed.clone();
        Ok(refreshed)
    }

    pub(crate) async fn worlds(&self) -> Result<Vec<Arc<WorldData>>> {
        {
            let worlds = self.inner.worlds.read();
            if !worlds.is_empty() {
                return Ok(worlds.clone());
            }
        }
        self.refresh_worlds(false).await
    }

    /// World names are folder names, e.g. `world` or `world_the_end`.
    pub(crate) async fn world_by_name(&self, name: &str) -> Result<Arc<WorldData>> {
        let lookup = |worlds: &[Arc<WorldData>]| worlds.iter().find(|w| w.name == name).cloned();
        let cached = lookup(&self.inner.worlds.read());
        if let Some(world) = cached {
            return Ok(world);
        }
        // A world may have been loaded since the last refresh.
        lookup(&self.refresh_worlds(false).await?).ok_or_else(|| {
            StatusError::WorldNotFound {
                extra: Some(format!("name={}", name)),
            }
            .into()
        })
    }

    pub(crate) async fn world_by_key(&self, key: &str) -> Result<Arc<WorldData>> {
        let key = normalize_world_key(key);
        self.worlds()
            .await?
            .into_iter()
            .find(|w| w.key == key)
            .ok_or_else(|| {
                StatusError::WorldNotFound {
                    extra: Some(format!("key={}", key)),
                }
                .into()
            })
    }

    pub(crate) fn entity(&self, id: &str) -> Entity {
        let inner = self
            .inner
            .entities
            .get_or_create(&id.to_string(), || EntityInner::new(self.clone(), id, false));
        Entity::from_inner(inner)
    }

    pub(crate) fn player(&self, name: &str) -> Player {
        let inner = self
            .inner
            .players
            .get_or_create(&name.to_string(), || EntityInner::new(self.clone(), name, true));
        Player::from_entity(Entity::from_inner(inner))
    }

    pub(crate) fn default_player_name(&self) -> Option<String> {
        self.inner.default_player.lock().clone()
    }

    /// Remembers the first player ever seen as the default player.
    pub(crate) fn offer_default_player(&self, name: &str) {
        let mut default_player = self.inner.default_player.lock();
        if default_player.is_none() {
            log::info!("Using {} as the default player", name);
            *default_player = Some(name.to_string());
        }
    }

    #[cfg(test)]
    pub(crate) fn cached_handles(&self) -> (usize, usize) {
        (
            self.inner.entities.live_count(),
            self.inner.players.live_count(),
        )
    }
}
