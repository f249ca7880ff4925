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

use std::{fmt::Debug, ops::Deref};

use mcpb_core::{
    protocol::{EntityLocation, EntityOrientation},
    Nbt, Vec3,
};

use crate::{entity::Entity, error::Result, world::WorldTarget};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameMode {
    Adventure,
    Creative,
    Spectator,
    Survival,
}

impl GameMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            GameMode::Adventure => "adventure",
            GameMode::Creative => "creative",
            GameMode::Spectator => "spectator",
            GameMode::Survival => "survival",
        }
    }
}

/// A player, online or not. Dereferences to [Entity] for the operations players share with
/// other entities; [Entity::loaded] and [Entity::remove] don't apply and return
/// [crate::Error::NotApplicable].
///
/// Operations on offline players succeed silently while `allow_offline_player_ops` is set.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Player {
    entity: Entity,
}

impl Deref for Player {
    type Target = Entity;

    fn deref(&self) -> &Self::Target {
        &self.entity
    }
}

impl Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player(name={})", self.name())
    }
}

impl Player {
    pub(crate) fn from_entity(entity: Entity) -> Self {
        Self { entity }
    }

    pub fn name(&self) -> &str {
        self.entity.id()
    }

    pub fn as_entity(&self) -> &Entity {
        &self.entity
    }

    pub async fn online(&self) -> Result<bool> {
        self.entity.ensure_fresh(true).await?;
        Ok(self.entity.cached_loaded())
    }

    pub async fn set_pos(&self, pos: Vec3) -> Result<()> {
        self.entity.teleport(Some(pos), None, None).await
    }

    /// Pitch in degrees: -90 is straight up, 90 straight down.
    pub async fn pitch(&self) -> Result<f64> {
        Ok(self.orientation().await?.1)
    }

    /// Yaw in degrees: -90 east, 0 south, 90 west, 180 north.
    pub async fn yaw(&self) -> Result<f64> {
        Ok(self.orientation().await?.0)
    }

    /// `(yaw, pitch)`
    pub async fn orientation(&self) -> Result<(f64, f64)> {
        self.entity.ensure_fresh(self.entity.allow_missing()).await?;
        Ok(self.entity.cached_orientation())
    }

    pub async fn set_pitch(&self, pitch: f64) -> Result<()> {
        let (yaw, _) = self.orientation().await?;
        self.set_orientation(yaw, pitch).await
    }

    pub async fn set_yaw(&self, yaw: f64) -> Result<()> {
        let (_, pitch) = self.orientation().await?;
        self.set_orientation(yaw, pitch).await
    }

    pub async fn set_orientation(&self, yaw: f64, pitch: f64) -> Result<()> {
        self.entity
            .set_location(EntityLocation {
                world: None,
                pos: None,
                orientation: Some(EntityOrientation { yaw, pitch }),
            })
            .await
    }

    pub async fn set_world<'a>(&self, world: impl Into<WorldTarget<'a>>) -> Result<()> {
        self.entity.teleport(None, None, Some(world.into())).await
    }

    pub async fn gamemode(&self, mode: GameMode) -> Result<()> {
        self.run_command(&format!("gamemode {}", mode.as_str())).await
    }

    pub async fn adventure(&self) -> Result<()> {
        self.gamemode(GameMode::Adventure).await
    }

    pub async fn creative(&self) -> Result<()> {
        self.gamemode(GameMode::Creative).await
    }

    pub async fn spectator(&self) -> Result<()> {
        self.gamemode(GameMode::Spectator).await
    }

    pub async fn survival(&self) -> Result<()> {
        self.gamemode(GameMode::Survival).await
    }

    pub async fn give_items(&self, item: &str, amount: u32, nbt: Option<&Nbt>) -> Result<()> {
        let nbt = nbt.map(|n| n.to_string()).unwrap_or_default();
        self.run_command(&format!("give @s {}{} {}", item, nbt, amount))
            .await
    }

    // Server-wide commands about this player rather than run as them.

    pub async fn kick(&self) -> Result<()> {
        self.conn().run_command(format!("kick {}", self.name())).await
    }

    pub async fn ban(&self) -> Result<()> {
        self.conn().run_command(format!("ban {}", self.name())).await
    }

    pub async fn pardon(&self) -> Result<()> {
        self.conn()
            .run_command(format!("pardon {}", self.name()))
            .await
    }

    pub async fn op(&self) -> Result<()> {
        self.conn().run_command(format!("op {}", self.name())).await
    }

    pub async fn deop(&self) -> Result<()> {
        self.conn().run_command(format!("deop {}", self.name())).await
    }
}
