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

use std::{fmt::Display, ops::Deref, sync::Arc};

use mcpb_core::{check_status, protocol::PlayerRequest, StatusError};

use crate::{
    connection::Connection,
    entity::Entity,
    error::Result,
    events::{
        BlockHitEvent, ChatEvent, EventHandler, EventKind, PlayerDeathEvent, PlayerJoinEvent,
        PlayerLeaveEvent, ProjectileHitEvent,
    },
    player::Player,
    settings::ClientSettings,
    world::{World, END_KEY, NETHER_KEY, OVERWORLD_KEY},
};

/// Connection to the server-side plugin.
///
/// Dereferences to the default [World], so `mc.set_block(...)` works without picking a world
/// first. Clones share the connection, the entity and player handles, and event polling.
#[derive(Clone)]
pub struct Minecraft {
    conn: Connection,
    default_world: World,
    events: Arc<EventHandler>,
}

impl Deref for Minecraft {
    type Target = World;

    fn deref(&self) -> &Self::Target {
        &self.default_world
    }
}

impl std::fmt::Debug for Minecraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Minecraft(host={}, port={})", self.host(), self.port())
    }
}

impl Minecraft {
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        Self::connect_with_settings(ClientSettings {
            host: host.to_string(),
            port,
            ..Default::default()
        })
        .await
    }

    pub async fn connect_with_settings(settings: ClientSettings) -> Result<Self> {
        let conn = Connection::connect(settings).await?;
        Ok(Self {
            default_world: World::default_world(conn.clone()),
            events: Arc::new(EventHandler::new(conn.clone())),
            conn,
        })
    }

    pub fn host(&self) -> &str {
        self.conn.host()
    }

    pub fn port(&self) -> u16 {
        self.conn.port()
    }

    pub fn settings(&self) -> &ClientSettings {
        self.conn.settings()
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Stops event polling. The connection itself closes once the last handle is dropped.
    pub async fn close(&self) {
        self.events.stop_polling_and_clear_callbacks().await;
    }

    pub async fn post_to_chat(&self, message: impl Display) -> Result<()> {
        self.conn.post_to_chat(message.to_string()).await
    }

    /// Joins `parts` with `sep` into one chat message.
    pub async fn post_to_chat_parts<T: Display>(&self, parts: &[T], sep: &str) -> Result<()> {
        let message = parts
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(sep);
        self.conn.post_to_chat(message).await
    }

    /// Refreshes the world list, e.g. after a plugin loaded a new world. Existing [World]
    /// handles stay valid unless `remake` is set.
    pub async fn refresh_worlds(&self, remake: bool) -> Result<()> {
        self.conn.refresh_worlds(remake).await?;
        Ok(())
    }

    pub async fn worlds(&self) -> Result<Vec<World>> {
        Ok(self
            .conn
            .worlds()
            .await?
            .into_iter()
            .map(|data| World::new(self.conn.clone(), Some(data)))
            .collect())
    }

    pub async fn overworld(&self) -> Result<World> {
        self.world_by_key(OVERWORLD_KEY).await
    }

    pub async fn nether(&self) -> Result<World> {
        self.world_by_key(NETHER_KEY).await
    }

    pub async fn end(&self) -> Result<World> {
        self.world_by_key(END_KEY).await
    }

    /// Looks a world up by folder name, e.g. `world_the_nether`.
    pub async fn world_by_name(&self, name: &str) -> Result<World> {
        let data = self.conn.world_by_name(name).await?;
        Ok(World::new(self.conn.clone(), Some(data)))
    }

    /// Looks a world up by key. The `minecraft:` prefix may be left out.
    pub async fn world_by_key(&self, key: &str) -> Result<World> {
        let data = self.conn.world_by_key(key).await?;
        Ok(World::new(self.conn.clone(), Some(data)))
    }

    /// The entity with this id, refreshed from the server. Usually entities come from
    /// [World::entities] or [World::spawn_entity] instead.
    pub async fn entity_by_id(&self, id: &str) -> Result<Entity> {
        let entity = self.conn.entity(id);
        entity.refresh(entity.allow_missing()).await?;
        Ok(entity)
    }

    /// A handle for `name` without checking whether that player is online.
    pub fn offline_player(&self, name: &str) -> Player {
        self.conn.player(name)
    }

    /// Online players, all of them or those among `names`.
    pub async fn players(&self, names: Option<&[&str]>) -> Result<Vec<Player>> {
        let request = PlayerRequest {
            names: names
                .unwrap_or_default()
                .iter()
                .map(|n| n.to_string())
                .collect(),
            with_locations: false,
        };
        let response = self.conn.client().get_players(request).await?.into_inner();
        check_status(response.status.as_ref())?;
        let players: Vec<Player> = response
            .players
            .iter()
            .map(|p| self.conn.player(&p.name))
            .collect();
        if let Some(first) = players.first() {
            self.conn.offer_default_player(first.name());
        }
        Ok(players)
    }

    pub async fn player_names(&self) -> Result<Vec<String>> {
        Ok(self
            .players(None)
            .await?
            .iter()
            .map(|p| p.name().to_string())
            .collect())
    }

    /// The named player if online. Without a name, the default player: the first player this
    /// connection ever saw.
    pub async fn player(&self, name: Option<&str>) -> Result<Player> {
        let name = match name {
            Some(name) => name.to_string(),
            None => match self.conn.default_player_name() {
                Some(name) => return Ok(self.conn.player(&name)),
                None => {
                    return self
                        .players(None)
                        .await?
                        .into_iter()
                        .next()
                        .ok_or_else(|| StatusError::PlayerNotFound { extra: None }.into())
                }
            },
        };
        self.players(Some(&[name.as_str()]))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StatusError::PlayerNotFound { extra: Some(name) }.into())
    }

    pub fn events(&self) -> &EventHandler {
        &self.events
    }

    /// See [EventHandler::poll].
    pub async fn poll_events<E: EventKind>(&self, maximum: Option<usize>) -> Result<Vec<E>> {
        self.events.poll(maximum).await
    }

    pub async fn poll_player_join_events(&self) -> Result<Vec<PlayerJoinEvent>> {
        self.events.poll(self.events.poll_default()).await
    }

    pub async fn poll_player_leave_events(&self) -> Result<Vec<PlayerLeaveEvent>> {
        self.events.poll(self.events.poll_default()).await
    }

    pub async fn poll_player_death_events(&self) -> Result<Vec<PlayerDeathEvent>> {
        self.events.poll(self.events.poll_default()).await
    }

    pub async fn poll_chat_events(&self) -> Result<Vec<ChatEvent>> {
        self.events.poll(self.events.poll_default()).await
    }

    pub async fn poll_block_hit_events(&self) -> Result<Vec<BlockHitEvent>> {
        self.events.poll(self.events.poll_default()).await
    }

    pub async fn poll_projectile_hit_events(&self) -> Result<Vec<ProjectileHitEvent>> {
        self.events.poll(self.events.poll_default()).await
    }

    pub async fn register_callback_player_join(
        &self,
        callback: impl Fn(PlayerJoinEvent) + Send + Sync + 'static,
    ) -> Result<()> {
        self.events.register_callback(callback).await
    }

    pub async fn register_callback_player_leave(
        &self,
        callback: impl Fn(PlayerLeaveEvent) + Send + Sync + 'static,
    ) -> Result<()> {
        self.events.register_callback(callback).await
    }

    pub async fn register_callback_player_death(
        &self,
        callback: impl Fn(PlayerDeathEvent) + Send + Sync + 'static,
    ) -> Result<()> {
        self.events.register_callback(callback).await
    }

    pub async fn register_callback_chat(
        &self,
        callback: impl Fn(ChatEvent) + Send + Sync + 'static,
    ) -> Result<()> {
        self.events.register_callback(callback).await
    }

    pub async fn register_callback_block_hit(
        &self,
        callback: impl Fn(BlockHitEvent) + Send + Sync + 'static,
    ) -> Result<()> {
        self.events.register_callback(callback).await
    }

    pub async fn register_callback_projectile_hit(
        &self,
        callback: impl Fn(ProjectileHitEvent) + Send + Sync + 'static,
    ) -> Result<()> {
        self.events.register_callback(callback).await
    }

    pub async fn stop_event_polling_and_clear_callbacks(&self) {
        self.events.stop_polling_and_clear_callbacks().await
    }
}
