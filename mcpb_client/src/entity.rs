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

use std::{
    cmp::Ordering,
    fmt::Debug,
    hash::{Hash, Hasher},
    sync::Arc,
    time::{Duration, Instant},
};

use mcpb_core::{
    check_status,
    protocol::{self, entity_request, EntityLocation, EntityOrientation, EntityRequest, PlayerRequest},
    Enchantment, Nbt, StatusError, Vec3,
};
use parking_lot::Mutex;

use crate::{
    connection::Connection,
    error::{Error, Result},
    world::{World, WorldData, WorldTarget},
};

#[derive(Default)]
struct EntityState {
    kind: Option<String>,
    world: Option<Arc<WorldData>>,
    pos: Vec3,
    yaw: f64,
    pitch: f64,
    loaded: bool,
    updated: Option<Instant>,
}

pub(crate) struct EntityInner {
    conn: Connection,
    id: String,
    is_player: bool,
    state: Mutex<EntityState>,
}

impl EntityInner {
    pub(crate) fn new(conn: Connection, id: &str, is_player: bool) -> Self {
        Self {
            conn,
            id: id.to_string(),
            is_player,
            state: Mutex::new(EntityState::default()),
        }
    }
}

/// Options for [Entity::replace_helmet].
#[derive(Clone, Debug, PartialEq)]
pub struct Helmet {
    pub armor_type: String,
    pub unbreakable: bool,
    /// Curse of binding, so players can't take it off.
    pub binding: bool,
    /// Curse of vanishing, so it disappears on death.
    pub vanishing: bool,
    /// Dye as 0xRRGGBB, see [mcpb_core::Color::code]. Only leather armor shows it.
    pub color: Option<u32>,
    /// Extra tags merged with the above.
    pub nbt: Nbt,
}

impl Default for Helmet {
    fn default() -> Self {
        Self {
            armor_type: "leather_helmet".to_string(),
            unbreakable: true,
            binding: true,
            vanishing: false,
            color: None,
            nbt: Nbt::new(),
        }
    }
}

/// Handle to an entity on the server. There is at most one live handle per entity id and
/// connection, so clones share cached state.
///
/// Position, orientation and world are cached for `cache_entity_time`
/// ([crate::settings::EntitySettings]) before they're queried again. Operations on unloaded or
/// dead entities succeed silently while `allow_unloaded_entity_ops` is set.
#[derive(Clone)]
pub struct Entity {
    inner: Arc<EntityInner>,
}

impl Entity {
    pub(crate) fn from_inner(inner: Arc<EntityInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.inner.conn
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn is_player(&self) -> bool {
        self.inner.is_player
    }

    /// The entity type, e.g. `"creeper"`, if the server has reported it yet.
    pub fn entity_type(&self) -> Option<String> {
        if self.inner.is_player {
            return Some("player".to_string());
        }
        self.inner.state.lock().kind.clone()
    }

    pub(crate) fn set_type(&self, kind: &str) {
        if !kind.is_empty() {
            self.inner.state.lock().kind = Some(kind.to_string());
        }
    }

    /// Last known position, without contacting the server.
    pub(crate) fn cached_pos(&self) -> Vec3 {
        self.inner.state.lock().pos
    }

    pub(crate) fn cached_orientation(&self) -> (f64, f64) {
        let state = self.inner.state.lock();
        (state.yaw, state.pitch)
    }

    pub(crate) fn cached_loaded(&self) -> bool {
        self.inner.state.lock().loaded
    }

    fn cache_time(&self) -> Duration {
        let settings = &self.inner.conn.settings().entities;
        if self.inner.is_player {
            settings.cache_player_time
        } else {
            settings.cache_entity_time
        }
    }

    pub(crate) fn allow_missing(&self) -> bool {
        let settings = &self.inner.conn.settings().entities;
        if self.inner.is_player {
            settings.allow_offline_player_ops
        } else {
            settings.allow_unloaded_entity_ops
        }
    }

    fn is_stale(&self) -> bool {
        let cache_time = self.cache_time();
        match self.inner.state.lock().updated {
            Some(updated) => updated.elapsed() > cache_time,
            None => true,
        }
    }

    pub(crate) fn invalidate(&self) {
        self.inner.state.lock().updated = None;
    }

    pub(crate) async fn ensure_fresh(&self, allow_missing: bool) -> Result<()> {
        if self.is_stale() {
            self.refresh(allow_missing).await?;
        }
        Ok(())
    }

    /// Queries the server. A missing entity marks the handle as not loaded and is an error
    /// unless `allow_missing`.
    pub(crate) async fn refresh(&self, allow_missing: bool) -> Result<()> {
        if self.inner.is_player {
            return self.refresh_player(allow_missing).await;
        }
        let request = EntityRequest {
            filter: Some(entity_request::Filter::Specific(
                entity_request::SpecificEntities {
                    entities: vec![protocol::Entity {
                        id: self.inner.id.clone(),
                        ..Default::default()
                    }],
                },
            )),
            with_locations: true,
        };
        let response = self.conn().client().get_entities(request).await?.into_inner();
        // Unknown ids are simply left out of the response.
        check_status(response.status.as_ref())?;
        match response.entities.into_iter().find(|e| e.id == self.inner.id) {
            Some(raw) => self.apply_update(&raw).await,
            None => {
                self.inner.state.lock().loaded = false;
                if allow_missing {
                    Ok(())
                } else {
                    Err(StatusError::EntityNotFound {
                        extra: Some(self.inner.id.clone()),
                    }
                    .into())
                }
            }
        }
    }

    async fn refresh_player(&self, allow_offline: bool) -> Result<()> {
        let response = self
            .conn()
            .client()
            .get_players(PlayerRequest {
                names: vec![self.inner.id.clone()],
                with_locations: true,
            })
            .await?
            .into_inner();
        match check_status(response.status.as_ref()) {
            Err(StatusError::PlayerNotFound { .. }) if allow_offline => {
                // The timestamp stays put so the next access asks again.
                self.inner.state.lock().loaded = false;
                return Ok(());
            }
            other => other?,
        }
        let player = response
            .players
            .into_iter()
            .find(|p| p.name == self.inner.id)
            .ok_or_else(|| {
                Error::Protocol(format!("getPlayers returned no entry for {}", self.inner.id))
            })?;
        self.apply_location(player.location.as_ref()).await
    }

    pub(crate) async fn apply_update(&self, raw: &protocol::Entity) -> Result<()> {
        self.set_type(&raw.r#type);
        self.apply_location(raw.location.as_ref()).await
    }

    async fn apply_location(&self, location: Option<&EntityLocation>) -> Result<()> {
        let world_name = location
            .and_then(|l| l.world.as_ref())
            .map(|w| w.name.as_str())
            .filter(|name| !name.is_empty());
        let world = match world_name {
            Some(name) => Some(self.conn().world_by_name(name).await?),
            None => None,
        };
        let mut state = self.inner.state.lock();
        if let Some(location) = location {
            if let Some(pos) = &location.pos {
                state.pos = pos.clone().into();
            }
            if let Some(orientation) = &location.orientation {
                state.yaw = orientation.yaw;
                state.pitch = orientation.pitch;
            }
        }
        if world.is_some() {
            state.world = world;
        }
        state.loaded = true;
        state.updated = Some(Instant::now());
        Ok(())
    }

    /// Whether the entity is alive and in a loaded chunk.
    pub async fn loaded(&self) -> Result<bool> {
        if self.inner.is_player {
            return Err(Error::NotApplicable("loaded"));
        }
        self.ensure_fresh(true).await?;
        Ok(self.cached_loaded())
    }

    pub async fn pos(&self) -> Result<Vec3> {
        self.ensure_fresh(self.allow_missing()).await?;
        Ok(self.cached_pos())
    }

    /// Unit vector of the direction the entity is looking at.
    pub async fn facing(&self) -> Result<Vec3> {
        self.ensure_fresh(self.allow_missing()).await?;
        let (yaw, pitch) = self.cached_orientation();
        Ok(Vec3::from_yaw_pitch(yaw, pitch))
    }

    pub async fn world(&self) -> Result<World> {
        self.ensure_fresh(self.allow_missing()).await?;
        let known = self.inner.state.lock().world.clone();
        let data = match known {
            Some(data) => data,
            None => self
                .conn()
                .worlds()
                .await?
                .into_iter()
                .next()
                .ok_or(StatusError::WorldNotFound { extra: None })?,
        };
        Ok(World::new(self.conn().clone(), Some(data)))
    }

    /// Changes any of position, facing direction and world. Whatever is `None` stays as it is;
    /// a new world keeps the relative coordinates.
    pub async fn teleport(
        &self,
        pos: Option<Vec3>,
        facing: Option<Vec3>,
        world: Option<WorldTarget<'_>>,
    ) -> Result<()> {
        if pos.is_none() && facing.is_none() && world.is_none() {
            return Ok(());
        }
        let world = match world {
            Some(target) => Some(target.resolve(self.conn()).await?),
            None => None,
        };
        let orientation = facing.map(|facing| {
            let (yaw, pitch) = facing.yaw_pitch();
            EntityOrientation { yaw, pitch }
        });
        self.set_location(EntityLocation {
            world,
            pos: pos.map(|p| p.to_proto_f()),
            orientation,
        })
        .await
    }

    pub(crate) async fn set_location(&self, location: EntityLocation) -> Result<()> {
        let mut client = self.conn().client();
        let status = if self.inner.is_player {
            client
                .set_player(protocol::Player {
                    name: self.inner.id.clone(),
                    location: Some(location),
                })
                .await?
                .into_inner()
        } else {
            client
                .set_entity(protocol::Entity {
                    id: self.inner.id.clone(),
                    r#type: String::new(),
                    location: Some(location),
                })
                .await?
                .into_inner()
        };
        match check_status(Some(&status)) {
            Err(StatusError::EntityNotFound { .. })
                if !self.inner.is_player && self.allow_missing() =>
            {
                log::debug!("{:?} is not loaded, ignoring move", self);
            }
            Err(StatusError::PlayerNotFound { .. })
                if self.inner.is_player && self.allow_missing() =>
            {
                log::debug!("{:?} is offline, ignoring move", self);
            }
            other => other?,
        }
        self.invalidate();
        Ok(())
    }

    /// Other entities within `distance` of this one.
    pub async fn entities_around(
        &self,
        distance: f64,
        entity_type: Option<&str>,
        only_spawnable: bool,
    ) -> Result<Vec<Entity>> {
        let pos = self.pos().await?;
        let entities = self
            .world()
            .await?
            .entities_around(pos, distance, entity_type, only_spawnable)
            .await?;
        Ok(entities.into_iter().filter(|e| e != self).collect())
    }

    /// Gives a potion effect such as `"glowing"`. Level is `amplifier + 1`.
    pub async fn give_effect(
        &self,
        effect: &str,
        seconds: u32,
        amplifier: u32,
        particles: bool,
    ) -> Result<()> {
        self.run_command(&format!(
            "effect give @s {} {} {} {}",
            effect, seconds, amplifier, !particles
        ))
        .await
    }

    pub async fn kill(&self) -> Result<()> {
        self.run_command("kill").await
    }

    /// Removes the entity without drops.
    pub async fn remove(&self) -> Result<()> {
        if self.inner.is_player {
            return Err(Error::NotApplicable("remove"));
        }
        self.run_command("tp ~ -50000 ~").await?;
        self.kill().await
    }

    /// Puts `amount` of `item` into `slot`, e.g. `"armor.chest"` or `"weapon.mainhand"`.
    pub async fn replace_item(
        &self,
        slot: &str,
        item: &str,
        amount: u32,
        nbt: Option<&Nbt>,
    ) -> Result<()> {
        let nbt = nbt.map(|n| n.to_string()).unwrap_or_default();
        self.run_command(&format!(
            "item replace entity @s {} with {}{} {}",
            slot, item, nbt, amount
        ))
        .await
    }

    pub async fn replace_helmet(&self, helmet: Helmet) -> Result<()> {
        let mut nbt = helmet.nbt;
        if helmet.binding {
            nbt.add_enchantment(Enchantment::BindingCurse, 1);
        }
        if helmet.vanishing {
            nbt.add_enchantment(Enchantment::VanishingCurse, 1);
        }
        if helmet.unbreakable {
            nbt.set_unbreakable();
        }
        if let Some(color) = helmet.color {
            nbt.set_color(color);
        }
        self.replace_item("armor.head", &helmet.armor_type, 1, Some(&nbt))
            .await
    }

    /// Runs a command as and at this entity. `@s` refers to the entity itself.
    pub async fn run_command(&self, command: &str) -> Result<()> {
        self.conn()
            .run_command(format!("execute as {} at @s run {}", self.inner.id, command))
            .await
    }
}

impl Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.inner.is_player {
            return write!(f, "Player(name={})", self.inner.id);
        }
        match self.entity_type() {
            Some(kind) => write!(f, "Entity(type={}, id={})", kind, self.inner.id),
            None => write!(f, "Entity(type=?, id={})", self.inner.id),
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.is_player == other.inner.is_player
                && self.inner.id == other.inner.id
                && self.inner.conn.same_as(&other.inner.conn))
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.is_player.hash(state);
        self.inner.id.hash(state);
    }
}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entity {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.inner.is_player, &self.inner.id).cmp(&(other.inner.is_player, &other.inner.id))
    }
}
